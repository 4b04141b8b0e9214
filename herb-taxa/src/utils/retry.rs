//! Retry with exponential backoff
//!
//! Used for both transient database lock errors and external service
//! failures. Retries are bounded by total wall-clock time, not attempt count.
//!
//! **Backoff Strategy:**
//! - Initial delay: 10ms
//! - Max delay: 1000ms
//! - Multiplier: 2.0 (exponential)

use herb_common::{Error, Result};
use std::time::{Duration, Instant};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// Retry an operation with exponential backoff until `max_wait_ms` elapses.
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If the error is transient:
///    a. If time elapsed < max_wait_ms: log WARN, backoff, retry
///    b. If time elapsed >= max_wait_ms: log ERROR, return the last error
/// 4. Otherwise return the error immediately (no retry)
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "insert taxon", "name match request")
/// * `max_wait_ms` - Maximum total time to retry
/// * `is_transient` - Decides whether an error is worth retrying
/// * `operation` - Async closure that performs the operation
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    operation_name: &str,
    max_wait_ms: u64,
    is_transient: P,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "Retrying operation");
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_transient(&err) {
                    return Err(err);
                }

                let elapsed = start_time.elapsed();

                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        max_wait_ms,
                        error = %err,
                        "Operation failed: max retry time exceeded"
                    );
                    return Err(err);
                }

                let remaining = max_duration.saturating_sub(elapsed);
                let sleep_for = Duration::from_millis(backoff_ms).min(remaining);

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    backoff_ms = sleep_for.as_millis() as u64,
                    remaining_ms = remaining.as_millis() as u64,
                    error = %err,
                    "Transient failure, will retry after backoff"
                );

                tokio::time::sleep(sleep_for).await;

                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}

/// Retry a database operation while SQLite reports the database as locked
///
/// Exhausting the wait budget turns the lock error into `Error::Internal`
/// so callers can tell "gave up waiting" from a one-off failure.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    match retry_with_backoff(operation_name, max_wait_ms, Error::is_lock_error, operation).await {
        Err(err) if err.is_lock_error() => Err(Error::Internal(format!(
            "{}: database locked for {} ms (max {} ms): {}",
            operation_name,
            start_time.elapsed().as_millis(),
            max_wait_ms,
            err
        ))),
        other => other,
    }
}
