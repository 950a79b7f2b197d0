/// Subscription model and database operations
///
/// Each user has at most one subscription row (unique `user_id`). The row is
/// created lazily the first time billing data is read, starting on the free
/// tier.
///
/// # State
///
/// ```text
/// {tier: free|pro|enterprise} x {status: active|canceled}
///
/// change / upgrade  -> {tier: <plan>, status: active, period_end: now + 30d}
/// cancel            -> {tier: free,   status: canceled, period_end: NULL}
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subscriptions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     tier subscription_tier NOT NULL DEFAULT 'free',
///     status subscription_status NOT NULL DEFAULT 'active',
///     current_period_end TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Length of a billing period
pub const BILLING_PERIOD_DAYS: i64 = 30;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }

    /// Parses a plan identifier (`"free"`, `"pro"`, `"enterprise"`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Some(SubscriptionTier::Free),
            "pro" => Some(SubscriptionTier::Pro),
            "enterprise" => Some(SubscriptionTier::Enterprise),
            _ => None,
        }
    }

    /// All tiers in ascending order
    pub fn all() -> [SubscriptionTier; 3] {
        [
            SubscriptionTier::Free,
            SubscriptionTier::Pro,
            SubscriptionTier::Enterprise,
        ]
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
}

/// Subscription model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,

    pub user_id: Uuid,

    pub tier: SubscriptionTier,

    pub status: SubscriptionStatus,

    /// End of the current billing period (None after cancel)
    pub current_period_end: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// End of a billing period starting at `from`
pub fn next_period_end(from: DateTime<Utc>) -> DateTime<Utc> {
    from + Duration::days(BILLING_PERIOD_DAYS)
}

impl Subscription {
    /// Finds the subscription for a user
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, tier, status, current_period_end, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Returns the user's subscription, creating a free one if none exists
    ///
    /// Concurrent first reads are safe: the insert is a no-op on conflict and
    /// the row is re-read afterwards.
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        if let Some(subscription) = Self::find_by_user(pool, user_id).await? {
            return Ok(subscription);
        }

        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, tier, status)
            VALUES ($1, 'free', 'active')
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Self::find_by_user(pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Sets the current period end
    pub async fn set_period_end(
        pool: &PgPool,
        id: Uuid,
        period_end: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET current_period_end = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, tier, status, current_period_end, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(period_end)
        .fetch_one(pool)
        .await
    }

    /// Writes tier, status and period end, creating the row if needed
    pub async fn apply(
        pool: &PgPool,
        user_id: Uuid,
        tier: SubscriptionTier,
        status: SubscriptionStatus,
        period_end: Option<DateTime<Utc>>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, tier, status, current_period_end)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET tier = EXCLUDED.tier,
                status = EXCLUDED.status,
                current_period_end = EXCLUDED.current_period_end,
                updated_at = NOW()
            RETURNING id, user_id, tier, status, current_period_end, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(tier)
        .bind(status)
        .bind(period_end)
        .fetch_one(pool)
        .await
    }

    /// Moves the user onto `tier` with a fresh billing period
    pub async fn change_tier(
        pool: &PgPool,
        user_id: Uuid,
        tier: SubscriptionTier,
    ) -> Result<Self, sqlx::Error> {
        Self::apply(
            pool,
            user_id,
            tier,
            SubscriptionStatus::Active,
            Some(next_period_end(Utc::now())),
        )
        .await
    }

    /// Cancels: back to free, status canceled, no period end
    pub async fn cancel(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        Self::apply(
            pool,
            user_id,
            SubscriptionTier::Free,
            SubscriptionStatus::Canceled,
            None,
        )
        .await
    }
}
