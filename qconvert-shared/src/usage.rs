/// Usage accounting
///
/// Usage is derived from live record counts every time it is requested; no
/// counters are kept for it. Plan limits are reported next to the usage and
/// never enforced.
///
/// # Example
///
/// ```no_run
/// use qconvert_shared::usage::UsageReport;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let usage = UsageReport::collect(&pool, user_id).await?;
/// println!("{} MB used", usage.storage_mb);
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog::plans::{PlanLimits, UNLIMITED};
use crate::models::code_conversion::{CodeConversion, ConversionFilter};
use crate::models::data_file::DataFile;
use crate::models::workflow::Workflow;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Converts bytes to megabytes rounded to two decimals
pub fn bytes_to_mb(bytes: i64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Current resource usage of one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub conversions: i64,
    pub files: i64,
    pub workflows: i64,
    pub storage_mb: f64,
}

impl UsageReport {
    /// Counts the user's records and sums their file sizes
    pub async fn collect(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let conversions =
            CodeConversion::count_by_user(pool, user_id, &ConversionFilter::default()).await?;
        let files = DataFile::count_by_user(pool, user_id).await?;
        let workflows = Workflow::count_by_user(pool, user_id).await?;
        let storage_bytes = DataFile::total_size_by_user(pool, user_id).await?;

        Ok(Self {
            conversions,
            files,
            workflows,
            storage_mb: bytes_to_mb(storage_bytes),
        })
    }

    /// Names of the resources whose usage has reached the plan limit
    pub fn at_limit(&self, limits: &PlanLimits) -> Vec<&'static str> {
        let mut reached = Vec::new();

        if reached_limit(self.conversions as f64, limits.conversions) {
            reached.push("conversions");
        }
        if reached_limit(self.files as f64, limits.files) {
            reached.push("files");
        }
        if reached_limit(self.workflows as f64, limits.workflows) {
            reached.push("workflows");
        }
        if reached_limit(self.storage_mb, limits.storage_mb) {
            reached.push("storage");
        }

        reached
    }
}

fn reached_limit(used: f64, limit: i64) -> bool {
    limit != UNLIMITED && used >= limit as f64
}
