//! Concurrent processing of domain lists.
//!
//! This module provides the `Dispatcher` that fans a domain list out across
//! a fixed number of workers and collects one result per domain.

use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, info};

use crate::executor::QueryExecutor;
use crate::retry::execute_with_retry;
use crate::types::{QueryResult, SweepConfig};

/// Fans domains out across a fixed-size worker pool.
///
/// Every domain is processed exactly once through the retry controller.
/// Each worker sleeps for the configured delay after finishing a domain
/// before it takes the next one. Results come back in completion order.
///
/// # Example
///
/// ```rust,no_run
/// use whois_sweep_lib::{Dispatcher, SweepConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let dispatcher = Dispatcher::new(SweepConfig::default().with_workers(5));
///     let domains = vec!["example.com".to_string(), "example.org".to_string()];
///
///     for result in dispatcher.run(&domains).await {
///         println!("{}: {}", result.domain(), result.is_success());
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: SweepConfig,
    executor: QueryExecutor,
}

impl Dispatcher {
    /// Create a dispatcher backed by the system `whois` command and DNS resolver.
    pub fn new(config: SweepConfig) -> Self {
        let executor = QueryExecutor::new(&config);
        Self { config, executor }
    }

    /// Create a dispatcher around an existing executor.
    pub fn with_executor(config: SweepConfig, executor: QueryExecutor) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Process every domain with the configured worker count.
    pub async fn run(&self, domains: &[String]) -> Vec<QueryResult> {
        self.run_with_workers(domains, self.config.workers).await
    }

    /// Process every domain with an explicit worker count (0 is treated as 1).
    pub async fn run_with_workers(&self, domains: &[String], workers: usize) -> Vec<QueryResult> {
        if domains.is_empty() {
            return Vec::new();
        }

        info!(domains = domains.len(), workers = workers.max(1), "Starting sweep");
        let results: Vec<QueryResult> = self.stream_with_workers(domains, workers).collect().await;

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(succeeded = results.len() - failed, failed, "Sweep finished");
        results
    }

    /// Yield results as they complete, using the configured worker count.
    pub fn stream(
        &self,
        domains: &[String],
    ) -> Pin<Box<dyn Stream<Item = QueryResult> + Send + '_>> {
        self.stream_with_workers(domains, self.config.workers)
    }

    fn stream_with_workers(
        &self,
        domains: &[String],
        workers: usize,
    ) -> Pin<Box<dyn Stream<Item = QueryResult> + Send + '_>> {
        let workers = workers.max(1);
        let max_retries = self.config.max_retries;
        let delay = self.config.delay;

        let stream = stream::iter(domains.to_vec())
            .map(move |domain| async move {
                let result = execute_with_retry(&self.executor, &domain, max_retries, delay).await;
                debug!(domain = %domain, success = result.is_success(), "Domain processed");

                // Throttle: the slot stays occupied until the pause is over
                tokio::time::sleep(delay).await;
                result
            })
            .buffer_unordered(workers);

        Box::pin(stream)
    }
}
