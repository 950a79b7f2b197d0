/// Converter backend that calls an external HTTP service
///
/// Request body: `{sourceLibrary, targetLibrary, code}`.
/// Response body: `{success, code, error?, complexity?}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{CodeConverter, ConversionOutcome, ConversionRequest};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertBody<'a> {
    source_library: &'a str,
    target_library: &'a str,
    code: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpCodeConverter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCodeConverter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, request: &ConversionRequest) -> Result<ConversionOutcome, reqwest::Error> {
        let body = ConvertBody {
            source_library: request.source_library.as_str(),
            target_library: request.target_library.as_str(),
            code: &request.code,
        };

        self.client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ConversionOutcome>()
            .await
    }
}

#[async_trait]
impl CodeConverter for HttpCodeConverter {
    async fn convert(&self, request: &ConversionRequest) -> ConversionOutcome {
        match self.call(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    source_library = %request.source_library,
                    target_library = %request.target_library,
                    error = %e,
                    "Converter request failed"
                );
                ConversionOutcome::failure(format!("Converter request failed: {}", e))
            }
        }
    }
}
