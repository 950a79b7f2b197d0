/// Authentication middleware
///
/// Two gates share one resolution path:
///
/// - [`jwt_auth_layer`] rejects the request with 401 unless the bearer token
///   names an active user, and injects the [`Identity`].
/// - [`optional_auth_layer`] never rejects; it injects a [`MaybeIdentity`]
///   that is empty when the request is anonymous or the token is unusable.
///
/// Handlers behind either gate can extract `Extension<MaybeIdentity>`; only
/// handlers behind the strict gate may extract `Extension<Identity>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use qconvert_shared::auth::identity::{authenticate, parse_bearer, AuthError, Identity};

use crate::{app::AppState, error::ApiError};

/// Identity slot filled by the optional gate
#[derive(Debug, Clone, Default)]
pub struct MaybeIdentity(pub Option<Identity>);

impl MaybeIdentity {
    pub fn user_id(&self) -> Option<uuid::Uuid> {
        self.0.as_ref().map(|identity| identity.user_id)
    }
}

fn authorization_header(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn resolve(state: &AppState, header: Option<String>) -> Result<Identity, AuthError> {
    let token = parse_bearer(header.as_deref())?;

    authenticate(&state.db, token, state.jwt_secret()).await
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token, then injects the caller's
/// [`Identity`] into request extensions.
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = authorization_header(&req);

    let identity = match resolve(&state, header).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(error = %e, path = %req.uri().path(), "Authentication rejected");
            return Err(e.into());
        }
    };

    req.extensions_mut()
        .insert(MaybeIdentity(Some(identity.clone())));
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Optional authentication middleware layer
///
/// Gate failures are logged and treated as an anonymous request.
pub async fn optional_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = authorization_header(&req);

    let identity = match resolve(&state, header).await {
        Ok(identity) => Some(identity),
        Err(AuthError::MissingCredentials) => None,
        Err(e) => {
            tracing::debug!(error = %e, path = %req.uri().path(), "Ignoring unusable credentials");
            None
        }
    };

    req.extensions_mut().insert(MaybeIdentity(identity));

    next.run(req).await
}
