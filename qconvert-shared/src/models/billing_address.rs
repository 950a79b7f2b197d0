/// Billing address model
///
/// At most one address per user (unique `user_id`); writes are upserts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Billing address model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address fields supplied by the user
#[derive(Debug, Clone)]
pub struct UpsertBillingAddress {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

impl BillingAddress {
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BillingAddress>(
            r#"
            SELECT id, user_id, name, line1, line2, city, state, postal_code, country,
                   created_at, updated_at
            FROM billing_addresses
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Inserts or replaces the user's address
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        data: UpsertBillingAddress,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BillingAddress>(
            r#"
            INSERT INTO billing_addresses (user_id, name, line1, line2, city, state, postal_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE
            SET name = EXCLUDED.name,
                line1 = EXCLUDED.line1,
                line2 = EXCLUDED.line2,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                postal_code = EXCLUDED.postal_code,
                country = EXCLUDED.country,
                updated_at = NOW()
            RETURNING id, user_id, name, line1, line2, city, state, postal_code, country,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(data.name)
        .bind(data.line1)
        .bind(data.line2)
        .bind(data.city)
        .bind(data.state)
        .bind(data.postal_code)
        .bind(data.country.to_ascii_uppercase())
        .fetch_one(pool)
        .await
    }
}
