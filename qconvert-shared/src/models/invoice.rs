/// Invoice model and database operations
///
/// Invoices are append-only: they are created when a user upgrades to a paid
/// tier and never updated afterwards.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invoices (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     invoice_number VARCHAR(32) NOT NULL UNIQUE,
///     plan subscription_tier NOT NULL,
///     amount_cents BIGINT NOT NULL CHECK (amount_cents >= 0),
///     currency VARCHAR(3) NOT NULL DEFAULT 'USD',
///     status invoice_status NOT NULL DEFAULT 'pending',
///     description VARCHAR(255) NOT NULL,
///     due_date TIMESTAMPTZ NOT NULL,
///     paid_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::PgPool;
use uuid::Uuid;

use super::subscription::SubscriptionTier;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Pending,
    Failed,
}

/// Invoice model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,

    pub user_id: Uuid,

    /// Human-facing number, e.g. `INV-20250103-7K2QZ9`
    pub invoice_number: String,

    pub plan: SubscriptionTier,

    /// Amount in minor units; serialized as `amount` in major units
    #[serde(rename = "amount", serialize_with = "serialize_major_units")]
    pub amount_cents: i64,

    pub currency: String,

    pub status: InvoiceStatus,

    pub description: String,

    pub due_date: DateTime<Utc>,

    pub paid_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

fn serialize_major_units<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    if cents % 100 == 0 {
        serializer.serialize_i64(cents / 100)
    } else {
        serializer.serialize_f64(*cents as f64 / 100.0)
    }
}

/// Input for creating an invoice
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub user_id: Uuid,
    pub plan: SubscriptionTier,
    pub amount_cents: i64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Generates an invoice number of the form `INV-<yyyymmdd>-<6 chars>`
pub fn generate_invoice_number(at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();

    format!("INV-{}-{}", at.format("%Y%m%d"), suffix)
}

impl Invoice {
    /// Creates an invoice with a freshly generated number
    pub async fn create(pool: &PgPool, data: CreateInvoice) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (user_id, invoice_number, plan, amount_cents, currency,
                                  status, description, due_date, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, invoice_number, plan, amount_cents, currency, status,
                      description, due_date, paid_at, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(generate_invoice_number(Utc::now()))
        .bind(data.plan)
        .bind(data.amount_cents)
        .bind(data.currency)
        .bind(data.status)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.paid_at)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's invoices, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, user_id, invoice_number, plan, amount_cents, currency, status,
                   description, due_date, paid_at, created_at
            FROM invoices
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts a user's invoices
    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_invoice_number_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap();
        let number = generate_invoice_number(at);

        assert!(number.starts_with("INV-20250103-"));
        let suffix = &number["INV-20250103-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_amount_serialized_in_major_units() {
        let invoice = Invoice {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            invoice_number: "INV-20250103-ABCDEF".to_string(),
            plan: SubscriptionTier::Pro,
            amount_cents: 2900,
            currency: "USD".to_string(),
            status: InvoiceStatus::Paid,
            description: "Pro plan".to_string(),
            due_date: Utc::now(),
            paid_at: Some(Utc::now()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["amount"], 29);
        assert_eq!(json["plan"], "pro");
        assert_eq!(json["status"], "paid");
        assert_eq!(json["currency"], "USD");
        assert!(json.get("amountCents").is_none());
    }

    #[test]
    fn test_fractional_amount_serialized_as_float() {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::new(&mut buf);
        serialize_major_units(&999, &mut serializer).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "9.99");
    }
}
