/// Database models for QConvert
///
/// Each model owns its CRUD operations as associated functions taking a
/// `&PgPool`. Ownership checks live in the handlers; finders that take only
/// an ID return the row regardless of owner so callers can tell a forbidden
/// record from a missing one.
///
/// # Models
///
/// - `user`: Accounts, credentials and activity counters
/// - `subscription`: One subscription per user (tier and status)
/// - `invoice`: Append-only invoices created on paid upgrades
/// - `payment_method`: Cards and PayPal accounts with a single default
/// - `billing_address`: One address per user
/// - `data_file`: Uploaded data files and inferred metadata
/// - `workflow`: Workflow records with inline steps
/// - `code_conversion`: Conversion history
/// - `quantum_library`: Supported library catalog
///
/// # Example
///
/// ```no_run
/// use qconvert_shared::models::subscription::Subscription;
/// use qconvert_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// // First read creates a free subscription
/// let subscription = Subscription::get_or_create(&pool, user_id).await?;
/// println!("tier = {}", subscription.tier.as_str());
/// # Ok(())
/// # }
/// ```

pub mod billing_address;
pub mod code_conversion;
pub mod data_file;
pub mod invoice;
pub mod payment_method;
pub mod quantum_library;
pub mod subscription;
pub mod user;
pub mod workflow;
