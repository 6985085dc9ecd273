//! Bounded retry around the query executor.

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::WhoisSweepError;
use crate::executor::QueryExecutor;
use crate::types::{QueryFailure, QueryResult};

/// Progress of one retry loop. Never shared across domains.
#[derive(Debug, Default)]
struct RetryState {
    attempt: usize,
    last_error: Option<WhoisSweepError>,
}

/// Query `domain`, retrying any failure up to `max_retries` more times.
///
/// Between attempts the controller sleeps a flat `2 × delay`. Only the
/// terminal attempt's outcome is returned; a final failure reports the last
/// error together with the number of attempts made.
pub async fn execute_with_retry(
    executor: &QueryExecutor,
    domain: &str,
    max_retries: usize,
    delay: Duration,
) -> QueryResult {
    let total_attempts = max_retries + 1;
    let backoff = delay * 2;
    let mut state = RetryState::default();

    while state.attempt < total_attempts {
        state.attempt += 1;

        match executor.query(domain).await {
            Ok(record) => return QueryResult::Success(record),
            Err(e) => {
                debug!(
                    domain = %domain,
                    attempt = state.attempt,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Query attempt failed"
                );
                state.last_error = Some(e);
            }
        }

        if state.attempt < total_attempts {
            tokio::time::sleep(backoff).await;
        }
    }

    let cause = state
        .last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempt was made".to_string());

    warn!(domain = %domain, attempts = state.attempt, error = %cause, "Query failed");

    QueryResult::Failure(QueryFailure {
        domain: domain.to_string(),
        error_message: format!("failed after {} attempts: {}", state.attempt, cause),
        attempts_made: state.attempt,
    })
}
