// ABOUTME: Generic retry-with-backoff wrapper for transient storage errors
// ABOUTME: Bounded attempts, doubling delay, caller-supplied retryable predicate

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Run `op`, retrying on errors the predicate marks transient.
///
/// The delay doubles after each failed attempt (1s, 2s, 4s with a 1s
/// initial delay). Non-retryable errors propagate immediately.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    max_attempts: u32,
    initial_delay: Duration,
    is_retryable: P,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut delay = initial_delay;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                warn!(
                    "Transient error (attempt {}/{}), retrying in {:?}: {}",
                    attempt, max_attempts, delay, e
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Transient sqlx failures worth retrying: connection drops and pool
/// timeouts. Constraint violations and decode errors propagate.
pub fn is_transient_db_error(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
}
