/// Payment method model and database operations
///
/// A user may store any number of payment methods, at most one of which is
/// the default. The single-default invariant is maintained by sequencing
/// (unset every default for the user, then set one) rather than by a
/// transaction, so two concurrent set-default calls can briefly leave two
/// defaults. The last writer wins on the next set-default.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payment_methods (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     method_type payment_method_type NOT NULL,
///     last4 VARCHAR(4),
///     brand VARCHAR(32),
///     expiry_month SMALLINT CHECK (expiry_month BETWEEN 1 AND 12),
///     expiry_year SMALLINT,
///     paypal_email VARCHAR(255),
///     is_default BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const PAYMENT_METHOD_COLUMNS: &str = "id, user_id, method_type, last4, brand, expiry_month, \
     expiry_year, paypal_email, is_default, created_at, updated_at";

/// Payment method kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodType {
    Card,
    Paypal,
}

/// Payment method model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: Uuid,

    pub user_id: Uuid,

    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,

    /// Last four card digits (cards only)
    pub last4: Option<String>,

    /// Card brand (cards only)
    pub brand: Option<String>,

    pub expiry_month: Option<i16>,

    pub expiry_year: Option<i16>,

    /// PayPal account address (PayPal only)
    pub paypal_email: Option<String>,

    pub is_default: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a payment method
#[derive(Debug, Clone)]
pub struct CreatePaymentMethod {
    pub user_id: Uuid,
    pub method_type: PaymentMethodType,
    pub last4: Option<String>,
    pub brand: Option<String>,
    pub expiry_month: Option<i16>,
    pub expiry_year: Option<i16>,
    pub paypal_email: Option<String>,
    pub is_default: bool,
}

/// Picks the method to promote after the default was deleted
///
/// The most recently created remaining method wins; ties (same timestamp)
/// fall back to the first one listed.
pub fn promotion_candidate(remaining: &[PaymentMethod]) -> Option<Uuid> {
    remaining
        .iter()
        .fold(None::<&PaymentMethod>, |best, pm| match best {
            Some(b) if b.created_at >= pm.created_at => Some(b),
            _ => Some(pm),
        })
        .map(|pm| pm.id)
}

impl PaymentMethod {
    /// Lists a user's payment methods, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM payment_methods WHERE user_id = $1 ORDER BY created_at DESC",
            PAYMENT_METHOD_COLUMNS
        );

        sqlx::query_as::<_, PaymentMethod>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Finds a payment method by ID regardless of owner
    ///
    /// Callers check `user_id` to distinguish forbidden from missing.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM payment_methods WHERE id = $1",
            PAYMENT_METHOD_COLUMNS
        );

        sqlx::query_as::<_, PaymentMethod>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Counts a user's payment methods
    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM payment_methods WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Creates a payment method
    ///
    /// The first method a user stores becomes the default regardless of the
    /// requested flag. Requesting default clears every other default first.
    pub async fn create(pool: &PgPool, data: CreatePaymentMethod) -> Result<Self, sqlx::Error> {
        let existing = Self::count_by_user(pool, data.user_id).await?;
        let is_default = data.is_default || existing == 0;

        if is_default {
            Self::unset_defaults(pool, data.user_id).await?;
        }

        let query = format!(
            "INSERT INTO payment_methods (user_id, method_type, last4, brand, expiry_month, \
             expiry_year, paypal_email, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            PAYMENT_METHOD_COLUMNS
        );

        sqlx::query_as::<_, PaymentMethod>(&query)
            .bind(data.user_id)
            .bind(data.method_type)
            .bind(data.last4)
            .bind(data.brand)
            .bind(data.expiry_month)
            .bind(data.expiry_year)
            .bind(data.paypal_email)
            .bind(is_default)
            .fetch_one(pool)
            .await
    }

    /// Clears the default flag on every method the user owns
    pub async fn unset_defaults(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payment_methods SET is_default = FALSE, updated_at = NOW() \
             WHERE user_id = $1 AND is_default",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Makes one method the user's default
    ///
    /// Returns `None` if no method with this ID belongs to the user.
    pub async fn set_default(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        Self::unset_defaults(pool, user_id).await?;

        let query = format!(
            "UPDATE payment_methods SET is_default = TRUE, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            PAYMENT_METHOD_COLUMNS
        );

        sqlx::query_as::<_, PaymentMethod>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a method, promoting a replacement default when needed
    ///
    /// Returns the promoted method's ID, if any.
    pub async fn delete(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let was_default: Option<bool> = sqlx::query_scalar(
            "DELETE FROM payment_methods WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        if was_default != Some(true) {
            return Ok(None);
        }

        let remaining = Self::list_by_user(pool, user_id).await?;
        match promotion_candidate(&remaining) {
            Some(next) => {
                Self::set_default(pool, next, user_id).await?;
                tracing::debug!(user_id = %user_id, promoted = %next, "Promoted payment method to default");
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }
}
