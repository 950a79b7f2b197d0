/// Code conversion
///
/// The converter itself is an external collaborator behind the
/// [`CodeConverter`] trait. This module validates requests, defines the
/// collaborator interface and its two backends, and describes how each HTTP
/// route persists outcomes ([`ConversionPolicy`]).
///
/// # Example
///
/// ```no_run
/// use qconvert_shared::convert::{CodeConverter, ConversionRequest, UnconfiguredConverter};
/// use qconvert_shared::models::quantum_library::LibraryId;
///
/// # async fn example() {
/// let converter = UnconfiguredConverter;
/// let outcome = converter
///     .convert(&ConversionRequest {
///         source_library: LibraryId::Qiskit,
///         target_library: LibraryId::Cirq,
///         code: "qc = QuantumCircuit(2)".to_string(),
///     })
///     .await;
/// assert!(!outcome.success);
/// # }
/// ```

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::quantum_library::LibraryId;

pub use http::HttpCodeConverter;

/// Upper bound on submitted source text, in characters
pub const MAX_SOURCE_LENGTH: usize = 10_000;

/// A validated conversion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub source_library: LibraryId,
    pub target_library: LibraryId,
    pub code: String,
}

impl ConversionRequest {
    /// Validates raw request fields
    ///
    /// Returns every problem found, in field order.
    pub fn parse(source: &str, target: &str, code: &str) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();

        let source_library = source.parse::<LibraryId>().map_err(|e| errors.push(e.to_string())).ok();
        let target_library = target.parse::<LibraryId>().map_err(|e| errors.push(e.to_string())).ok();

        if let (Some(s), Some(t)) = (source_library, target_library) {
            if s == t {
                errors.push("Source and target libraries must be different".to_string());
            }
        }

        let length = code.chars().count();
        if length == 0 {
            errors.push("Code is required".to_string());
        } else if length > MAX_SOURCE_LENGTH {
            errors.push(format!(
                "Code must be at most {} characters",
                MAX_SOURCE_LENGTH
            ));
        }

        match (source_library, target_library, errors.is_empty()) {
            (Some(source_library), Some(target_library), true) => Ok(Self {
                source_library,
                target_library,
                code: code.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// What the converter reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    pub success: bool,

    /// Converted source text (empty on failure)
    #[serde(default)]
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Converter's complexity rating (`low`, `medium`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
}

impl ConversionOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: String::new(),
            error: Some(error.into()),
            complexity: None,
        }
    }
}

/// The external code converter
///
/// Implementations never return an error: transport and converter failures
/// are reported as an unsuccessful outcome.
#[async_trait]
pub trait CodeConverter: Send + Sync {
    async fn convert(&self, request: &ConversionRequest) -> ConversionOutcome;
}

/// Backend used when no converter endpoint is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredConverter;

#[async_trait]
impl CodeConverter for UnconfiguredConverter {
    async fn convert(&self, _request: &ConversionRequest) -> ConversionOutcome {
        ConversionOutcome::failure("Code converter is not configured")
    }
}

/// How a route records conversion outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPolicy {
    /// Record successes and failures; a failed write fails the request
    RecordAll,

    /// Record successes only; a failed write is logged and ignored
    RecordSuccessSoft,
}

impl ConversionPolicy {
    /// Whether an outcome with this success flag should be stored
    pub fn should_record(&self, success: bool) -> bool {
        match self {
            ConversionPolicy::RecordAll => true,
            ConversionPolicy::RecordSuccessSoft => success,
        }
    }

    /// Whether a failed history write fails the request
    pub fn persistence_is_required(&self) -> bool {
        matches!(self, ConversionPolicy::RecordAll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_request() {
        let request = ConversionRequest::parse("qiskit", "cirq", "qc = QuantumCircuit(1)").unwrap();
        assert_eq!(request.source_library, LibraryId::Qiskit);
        assert_eq!(request.target_library, LibraryId::Cirq);
    }

    #[test]
    fn test_parse_same_library() {
        let errors = ConversionRequest::parse("cirq", "cirq", "x").unwrap_err();
        assert_eq!(errors, vec!["Source and target libraries must be different"]);
    }

    #[test]
    fn test_parse_unknown_library_and_empty_code() {
        let errors = ConversionRequest::parse("quil", "cirq", "").unwrap_err();
        assert_eq!(
            errors,
            vec!["Unsupported library: quil".to_string(), "Code is required".to_string()]
        );
    }

    #[test]
    fn test_parse_code_length_bound() {
        let at_limit = "x".repeat(MAX_SOURCE_LENGTH);
        assert!(ConversionRequest::parse("qiskit", "braket", &at_limit).is_ok());

        let over = "x".repeat(MAX_SOURCE_LENGTH + 1);
        let errors = ConversionRequest::parse("qiskit", "braket", &over).unwrap_err();
        assert_eq!(errors, vec!["Code must be at most 10000 characters"]);
    }

    #[tokio::test]
    async fn test_unconfigured_converter() {
        let request = ConversionRequest::parse("qiskit", "pyquil", "h 0").unwrap();
        let outcome = UnconfiguredConverter.convert(&request).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Code converter is not configured"));
    }

    #[test]
    fn test_policies() {
        assert!(ConversionPolicy::RecordAll.should_record(true));
        assert!(ConversionPolicy::RecordAll.should_record(false));
        assert!(ConversionPolicy::RecordAll.persistence_is_required());

        assert!(ConversionPolicy::RecordSuccessSoft.should_record(true));
        assert!(!ConversionPolicy::RecordSuccessSoft.should_record(false));
        assert!(!ConversionPolicy::RecordSuccessSoft.persistence_is_required());
    }
}
