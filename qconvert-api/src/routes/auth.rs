/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new user
/// - `POST /api/auth/login` - Login and get a token
/// - `GET /api/auth/me` - Current user's profile
/// - `PUT /api/auth/profile` - Update name, avatar and preferences
/// - `PUT /api/auth/password` - Change password
/// - `GET /api/auth/google`, `GET /api/auth/github` - Mock OAuth sign-in
///
/// The OAuth routes perform no third-party verification: they find or create
/// a user for the supplied (or generated) email and redirect to the frontend
/// with a token.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Query},
    response::{created, ok, ok_with_message, ApiResponse},
};
use axum::{extract::State, http::StatusCode, response::Redirect, Extension};
use chrono::Utc;
use qconvert_shared::{
    auth::{identity::Identity, password},
    models::user::{normalize_email, AuthProvider, CreateUser, UpdateProfile, User},
};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
///
/// Missing fields default to empty so they fail validation with a field
/// message rather than a deserialization error.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token plus the user it was issued for
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,

    /// An empty string clears the avatar
    #[validate(length(max = 500, message = "Avatar URL must be at most 500 characters"))]
    pub avatar_url: Option<String>,

    pub preferences: Option<JsonValue>,
}

/// Password change request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Mock OAuth query parameters
#[derive(Debug, Deserialize, Validate)]
pub struct OAuthQuery {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    req.name = req.name.trim().to_string();
    req.email = normalize_email(&req.email);
    req.validate()?;

    if User::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    // The unique index still maps a concurrent duplicate to 409
    let mut user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            name: req.name,
            password_hash,
            auth_provider: AuthProvider::Local,
            avatar_url: None,
        },
    )
    .await?;

    User::update_last_login(&state.db, user.id).await?;
    user.last_login_at = Some(Utc::now());

    let token = state.issue_token(user.id)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(created(AuthResponse { token, user }))
}

/// Login endpoint
///
/// # Errors
///
/// - `400 Bad Request`: Malformed email or empty password
/// - `404 Not Found`: No account for this email
/// - `401 Unauthorized`: Wrong password or deactivated account
pub async fn login(
    State(state): State<AppState>,
    Json(mut req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    let mut user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;
    user.last_login_at = Some(Utc::now());

    let token = state.issue_token(user.id)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(ok(AuthResponse { token, user }))
}

/// Current user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = User::find_by_id(&state.db, identity.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ok(user))
}

/// Update profile fields
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(mut req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    req.name = req.name.map(|n| n.trim().to_string());
    req.validate()?;

    if let Some(preferences) = &req.preferences {
        if !preferences.is_object() {
            return Err(ApiError::invalid_field(
                "preferences",
                "Preferences must be an object",
            ));
        }
    }

    let avatar_url = req.avatar_url.map(|url| {
        let url = url.trim().to_string();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    });

    let user = User::update_profile(
        &state.db,
        identity.user_id,
        UpdateProfile {
            name: req.name,
            avatar_url,
            preferences: req.preferences,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ok_with_message(user, "Profile updated successfully"))
}

/// Change password
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `400 Bad Request`: New password too short
pub async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<JsonValue>>> {
    password::validate_password_length(&req.new_password)
        .map_err(|message| ApiError::invalid_field("newPassword", message))?;

    let user = User::find_by_id(&state.db, identity.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.new_password)?;
    User::update_password_hash(&state.db, user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(ok_with_message(JsonValue::Null, "Password updated successfully"))
}

/// Mock Google sign-in
pub async fn google_oauth(
    State(state): State<AppState>,
    Query(query): Query<OAuthQuery>,
) -> ApiResult<Redirect> {
    oauth_sign_in(&state, AuthProvider::Google, query).await
}

/// Mock GitHub sign-in
pub async fn github_oauth(
    State(state): State<AppState>,
    Query(query): Query<OAuthQuery>,
) -> ApiResult<Redirect> {
    oauth_sign_in(&state, AuthProvider::Github, query).await
}

/// Placeholder address for callers that supply no email
fn generated_email(provider: AuthProvider) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();

    format!("{}-user-{}@example.com", provider.as_str(), suffix)
}

fn default_display_name(provider: AuthProvider) -> String {
    match provider {
        AuthProvider::Google => "Google User".to_string(),
        AuthProvider::Github => "GitHub User".to_string(),
        AuthProvider::Local => "User".to_string(),
    }
}

async fn oauth_sign_in(
    state: &AppState,
    provider: AuthProvider,
    query: OAuthQuery,
) -> ApiResult<Redirect> {
    query.validate()?;

    let email = query
        .email
        .as_deref()
        .map(normalize_email)
        .unwrap_or_else(|| generated_email(provider));

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(user) => user,
        None => {
            let user = User::create(
                &state.db,
                CreateUser {
                    email,
                    name: query
                        .name
                        .map(|n| n.trim().to_string())
                        .unwrap_or_else(|| default_display_name(provider)),
                    password_hash: password::unusable_password_hash()?,
                    auth_provider: provider,
                    avatar_url: None,
                },
            )
            .await?;

            tracing::info!(user_id = %user.id, provider = provider.as_str(), "OAuth user created");
            user
        }
    };

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let token = state.issue_token(user.id)?;

    Ok(Redirect::temporary(&format!(
        "{}/auth/callback?token={}",
        state.config.api.frontend_url, token
    )))
}
