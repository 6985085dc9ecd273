//! # WHOIS Sweep Library
//!
//! Batch WHOIS lookups with network enrichment.
//!
//! A list of domains is fanned out across a fixed pool of workers. Each
//! domain is queried over WHOIS with bounded retries, its registrar and
//! expiration are extracted (structured parse first, heuristics second),
//! and it is optionally enriched with resolved addresses and an origin ASN.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_sweep_lib::{Dispatcher, QueryResult, SweepConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SweepConfig::default().with_workers(4).with_asn(true);
//!     let dispatcher = Dispatcher::new(config);
//!
//!     let domains = vec!["example.com".to_string(), "example.org".to_string()];
//!     for result in dispatcher.run(&domains).await {
//!         match result {
//!             QueryResult::Success(record) => {
//!                 println!("{} expires {} ({})", record.domain, record.expiration, record.asn)
//!             }
//!             QueryResult::Failure(failure) => {
//!                 println!("{}: {}", failure.domain, failure.error_message)
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded concurrency**: fixed worker pool with per-worker throttling
//! - **Retries**: flat backoff, failures reported with their last cause
//! - **ASN lookup**: DNS fast path with a time-bounded WHOIS fallback
//! - **Pluggable collaborators**: WHOIS source, parser, resolver and text dialect are traits

// Re-export main public API types and functions
pub use asn::AsnResolver;
pub use concurrent::Dispatcher;
pub use config::{
    env_config_from, load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig, OutputConfig,
};
pub use dates::{normalize, normalize_at, NormalizedDate};
pub use error::WhoisSweepError;
pub use executor::QueryExecutor;
pub use heuristics::{extract_as_number, extract_asn, extract_country, DefaultDialect, ResponseDialect};
pub use protocols::{
    is_whois_available, DnsResolver, HostResolver, ParsedRecord, RecordParser, StructuredParser,
    SystemWhois, WhoisSource,
};
pub use retry::execute_with_retry;
pub use types::{
    DomainRecord, Expiration, OutputFormat, QueryFailure, QueryOptions, QueryResult, ResultRow,
    SweepConfig, FAILED_REGISTRAR, SENTINEL,
};
pub use utils::{parse_domain_list, truncate_expiration, truncate_registrar, validate_domain};

pub mod asn;
pub mod dates;
pub mod heuristics;
pub mod protocols;

// Internal modules - their items are re-exported above
mod concurrent;
mod config;
mod error;
mod executor;
mod retry;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WhoisSweepError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
