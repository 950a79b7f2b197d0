/// User model and database operations
///
/// Users own every other record in the platform (subscriptions, payment
/// methods, files, workflows, conversions). Accounts are never hard-deleted;
/// deactivation flips `is_active` and the authentication gate rejects the
/// account from then on.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(50) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     auth_provider auth_provider NOT NULL DEFAULT 'local',
///     avatar_url VARCHAR(512),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     total_conversions INTEGER NOT NULL DEFAULT 0,
///     successful_conversions INTEGER NOT NULL DEFAULT 0,
///     files_uploaded INTEGER NOT NULL DEFAULT 0,
///     workflows_created INTEGER NOT NULL DEFAULT 0,
///     preferences JSONB NOT NULL DEFAULT '{}',
///     last_login_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use qconvert_shared::models::user::{User, CreateUser, AuthProvider};
/// use qconvert_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "Ada@Example.com ".to_string(),
///     name: "Ada Lovelace".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     auth_provider: AuthProvider::Local,
///     avatar_url: None,
/// }).await?;
///
/// // Lookups normalize the address the same way inserts do
/// let found = User::find_by_email(&pool, "ada@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, name, password_hash, role, auth_provider, avatar_url, \
     is_active, total_conversions, successful_conversions, files_uploaded, workflows_created, \
     preferences, last_login_at, created_at, updated_at";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// How the account was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
    Github,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
            AuthProvider::Github => "github",
        }
    }
}

/// Per-user activity counters
///
/// Counters are bumped best-effort by the handlers that create the
/// corresponding records, so they can drift from the live record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_conversions: i32,
    pub successful_conversions: i32,
    pub files_uploaded: i32,
    pub workflows_created: i32,
}

/// A single counter in [`UserStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCounter {
    TotalConversions,
    SuccessfulConversions,
    FilesUploaded,
    WorkflowsCreated,
}

impl StatCounter {
    /// Column backing this counter
    pub fn column(&self) -> &'static str {
        match self {
            StatCounter::TotalConversions => "total_conversions",
            StatCounter::SuccessfulConversions => "successful_conversions",
            StatCounter::FilesUploaded => "files_uploaded",
            StatCounter::WorkflowsCreated => "workflows_created",
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Normalized (trimmed, lowercased) email address
    pub email: String,

    /// Display name (2-50 characters)
    pub name: String,

    /// Argon2id password hash; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: UserRole,

    pub auth_provider: AuthProvider,

    pub avatar_url: Option<String>,

    /// Deactivated accounts cannot authenticate
    pub is_active: bool,

    #[sqlx(flatten)]
    pub stats: UserStats,

    /// Free-form UI preferences (theme, default libraries, ...)
    pub preferences: JsonValue,

    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address; normalized before insert
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    pub auth_provider: AuthProvider,

    pub avatar_url: Option<String>,
}

/// Profile fields a user may edit
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub name: Option<String>,

    /// `Some(None)` clears the avatar
    pub avatar_url: Option<Option<String>>,

    /// Replaces the stored preferences object
    pub preferences: Option<JsonValue>,
}

/// Normalizes an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error with the `users_email_key` constraint if the
    /// email is already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, name, password_hash, auth_provider, avatar_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.name.trim())
            .bind(data.password_hash)
            .bind(data.auth_provider)
            .bind(data.avatar_url)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (normalized before lookup)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Checks whether an email address is already registered
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(normalize_email(email))
            .fetch_one(pool)
            .await
    }

    /// Updates editable profile fields
    ///
    /// Only `Some` fields are written. Returns `None` if the user doesn't exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.avatar_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar_url = ${}", bind_count));
        }
        if data.preferences.is_some() {
            bind_count += 1;
            query.push_str(&format!(", preferences = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name.trim().to_string());
        }
        if let Some(avatar_url) = data.avatar_url {
            q = q.bind(avatar_url);
        }
        if let Some(preferences) = data.preferences {
            q = q.bind(preferences);
        }

        q.fetch_optional(pool).await
    }

    /// Replaces the stored password hash
    pub async fn update_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stamps the last login time
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Activates or deactivates an account
    pub async fn set_active(pool: &PgPool, id: Uuid, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds one to a stats counter
    pub async fn increment_stat(
        pool: &PgPool,
        id: Uuid,
        counter: StatCounter,
    ) -> Result<bool, sqlx::Error> {
        let column = counter.column();
        let query = format!("UPDATE users SET {0} = {0} + 1 WHERE id = $1", column);

        let result = sqlx::query(&query).bind(id).execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_stat_counter_columns() {
        assert_eq!(StatCounter::TotalConversions.column(), "total_conversions");
        assert_eq!(StatCounter::SuccessfulConversions.column(), "successful_conversions");
        assert_eq!(StatCounter::FilesUploaded.column(), "files_uploaded");
        assert_eq!(StatCounter::WorkflowsCreated.column(), "workflows_created");
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::User,
            auth_provider: AuthProvider::Local,
            avatar_url: None,
            is_active: true,
            stats: UserStats::default(),
            preferences: serde_json::json!({}),
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["isActive"], true);
        assert_eq!(json["stats"]["totalConversions"], 0);
        assert_eq!(json["authProvider"], "local");
    }

    #[test]
    fn test_update_profile_default() {
        let update = UpdateProfile::default();
        assert!(update.name.is_none());
        assert!(update.avatar_url.is_none());
        assert!(update.preferences.is_none());
    }
}
