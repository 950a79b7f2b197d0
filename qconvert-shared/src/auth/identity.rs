/// Request identity resolution
///
/// Turns the `Authorization` header of a request into an [`Identity`]: the
/// bearer token is validated, the referenced user is loaded, and deactivated
/// accounts are rejected. Handlers only ever see the normalized identity,
/// never raw claims.
///
/// # Example
///
/// ```no_run
/// use qconvert_shared::auth::identity::{authenticate, parse_bearer};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, header: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
/// let token = parse_bearer(header)?;
/// let identity = authenticate(&pool, token, "jwt-secret").await?;
/// println!("request made by {}", identity.email);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::{User, UserRole};

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl Identity {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Access denied. No token provided")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header format")]
    InvalidFormat,

    /// Signature, issuer or timing check failed
    #[error("Invalid token")]
    InvalidToken(#[source] JwtError),

    /// Token is well-formed but expired
    #[error("Token expired")]
    TokenExpired,

    /// Token refers to a user that no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Account exists but is deactivated
    #[error("Account is deactivated")]
    AccountDeactivated,

    /// Lookup failed
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            other => AuthError::InvalidToken(other),
        }
    }
}

/// Extracts the token from an `Authorization` header value
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredentials)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Validates a token and loads the active user it names
pub async fn authenticate(pool: &PgPool, token: &str, secret: &str) -> Result<Identity, AuthError> {
    let claims = validate_token(token, secret)?;

    let user = User::find_by_id(pool, claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !user.is_active {
        return Err(AuthError::AccountDeactivated);
    }

    Ok(Identity::from_user(&user))
}
