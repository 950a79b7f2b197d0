/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the length rule
/// - [`jwt`]: HS256 token issuance and validation
/// - [`identity`]: Bearer token to [`identity::Identity`] resolution
/// - [`authorization`]: Record ownership checks
///
/// # Example
///
/// ```no_run
/// use qconvert_shared::auth::password::{hash_password, verify_password};
/// use qconvert_shared::auth::jwt::{issue_token, validate_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let user_id = Uuid::new_v4();
/// let token = issue_token(user_id, "secret-key-at-least-32-bytes-long!!", 168)?;
/// assert_eq!(validate_token(&token, "secret-key-at-least-32-bytes-long!!")?.sub, user_id);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod password;
