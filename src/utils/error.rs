//! Error handling helpers for graceful degradation

use tracing::warn;

/// Execute an operation and log errors without failing
///
/// Returns `Some(T)` on success, `None` on error (after logging).
/// Used where one mod's failure must not stop the others.
///
/// # Example
/// ```rust
/// use modhost::utils::log_error;
///
/// let parsed = log_error(|| "42".parse::<u32>(), "Failed to parse");
/// assert_eq!(parsed, Some(42));
/// ```
pub fn log_error<F, T, E>(operation: F, context: &str) -> Option<T>
where
    F: FnOnce() -> Result<T, E>,
    E: std::fmt::Display,
{
    match operation() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: {}", context, e);
            None
        }
    }
}
