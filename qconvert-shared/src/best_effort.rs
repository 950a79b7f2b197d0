/// Outcome of a side effect that must never fail the request
///
/// Stats counters, metadata inference and fail-soft history writes are
/// attempted, and on failure the reason is logged at `warn` and carried as
/// [`BestEffort::Skipped`]. Callers may inspect the outcome but never turn a
/// skip into an error response.
///
/// # Example
///
/// ```
/// use qconvert_shared::best_effort::BestEffort;
///
/// let parsed: BestEffort<u32> = BestEffort::from_result("parse row count", "12".parse::<u32>());
/// assert_eq!(parsed.applied(), Some(&12));
///
/// let failed: BestEffort<u32> = BestEffort::from_result("parse row count", "x".parse::<u32>());
/// assert!(failed.is_skipped());
/// assert_eq!(failed.unwrap_or_default(), 0);
/// ```

use std::fmt::Display;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
    Applied(T),
    Skipped(String),
}

impl<T> BestEffort<T> {
    /// Wraps a result, logging the error when there is one
    pub fn from_result<E: Display>(what: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => BestEffort::Applied(value),
            Err(e) => {
                tracing::warn!(operation = what, error = %e, "Best-effort operation skipped");
                BestEffort::Skipped(e.to_string())
            }
        }
    }

    /// Awaits a fallible future and wraps its result
    pub async fn attempt<F, E>(what: &str, fut: F) -> Self
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        Self::from_result(what, fut.await)
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, BestEffort::Applied(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, BestEffort::Skipped(_))
    }

    pub fn applied(&self) -> Option<&T> {
        match self {
            BestEffort::Applied(value) => Some(value),
            BestEffort::Skipped(_) => None,
        }
    }

    pub fn into_applied(self) -> Option<T> {
        match self {
            BestEffort::Applied(value) => Some(value),
            BestEffort::Skipped(_) => None,
        }
    }

    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_applied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        let ok: BestEffort<i32> = BestEffort::from_result("ok", Ok::<_, String>(3));
        assert!(ok.is_applied());
        assert_eq!(ok.into_applied(), Some(3));

        let err: BestEffort<i32> = BestEffort::from_result("err", Err::<i32, _>("boom"));
        assert_eq!(err, BestEffort::Skipped("boom".to_string()));
    }

    #[tokio::test]
    async fn test_attempt() {
        let applied = BestEffort::attempt("async ok", async { Ok::<_, String>("done") }).await;
        assert_eq!(applied.applied(), Some(&"done"));

        let skipped =
            BestEffort::<()>::attempt("async err", async { Err::<(), _>("unreachable db") }).await;
        assert!(skipped.is_skipped());
    }
}
