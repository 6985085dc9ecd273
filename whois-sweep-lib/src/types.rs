//! Core data types for WHOIS sweeps.
//!
//! This module defines the per-domain results produced by the pipeline,
//! their flat display form, and the configuration threaded through the
//! dispatcher, executor and ASN resolver.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder for any field that was not requested, not found, or not resolvable.
pub const SENTINEL: &str = "-";

/// Registrar shown for a failed query.
pub const FAILED_REGISTRAR: &str = "Query Failed";

/// Which optional enrichments a query performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Resolve the origin ASN of the domain's first IPv4 address
    pub include_asn: bool,

    /// Report the domain's IPv4 addresses
    pub include_ipv4: bool,

    /// Report the domain's IPv6 addresses
    pub include_ipv6: bool,
}

impl QueryOptions {
    /// Whether any address family was requested.
    pub fn wants_addresses(&self) -> bool {
        self.include_ipv4 || self.include_ipv6
    }
}

/// Configuration for a sweep.
///
/// Replaces process-wide flags: one value is handed to the dispatcher and
/// shared read-only by every worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Number of concurrent workers
    /// Default: 3, Range: 1-100
    pub workers: usize,

    /// Additional attempts after the first failure
    /// Default: 2
    pub max_retries: usize,

    /// Pause after each completed domain; retries wait twice this long
    /// Default: 1000ms
    #[serde(skip)]
    pub delay: Duration,

    /// Optional enrichments
    pub options: QueryOptions,

    /// Bound on a single WHOIS fetch
    /// Default: 15 seconds
    #[serde(skip)]
    pub whois_timeout: Duration,

    /// Bound on a single DNS lookup
    /// Default: 5 seconds
    #[serde(skip)]
    pub dns_timeout: Duration,

    /// Bound on the WHOIS-based ASN fallback
    /// Default: 10 seconds
    #[serde(skip)]
    pub asn_timeout: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            max_retries: 2,
            delay: Duration::from_millis(1000),
            options: QueryOptions::default(),
            whois_timeout: Duration::from_secs(15),
            dns_timeout: Duration::from_secs(5),
            asn_timeout: Duration::from_secs(10),
        }
    }
}

impl SweepConfig {
    /// Set the worker count, capped to 1-100.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, 100);
        self
    }

    /// Set how many times a failed domain is retried.
    pub fn with_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the inter-query delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Enable or disable ASN lookup.
    pub fn with_asn(mut self, enabled: bool) -> Self {
        self.options.include_asn = enabled;
        self
    }

    /// Enable or disable IPv4 reporting.
    pub fn with_ipv4(mut self, enabled: bool) -> Self {
        self.options.include_ipv4 = enabled;
        self
    }

    /// Enable or disable IPv6 reporting.
    pub fn with_ipv6(mut self, enabled: bool) -> Self {
        self.options.include_ipv6 = enabled;
        self
    }

    /// Set the WHOIS fetch timeout.
    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    /// Set the DNS lookup timeout.
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Set the ASN fallback timeout.
    pub fn with_asn_timeout(mut self, timeout: Duration) -> Self {
        self.asn_timeout = timeout;
        self
    }
}

/// Display form of a domain's expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiration {
    /// Successfully normalized calendar date
    Date(NaiveDate),

    /// Unparseable timestamp, truncated for display
    Raw(String),

    /// No expiration found at all
    Unknown,
}

impl std::fmt::Display for Expiration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expiration::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Expiration::Raw(raw) => write!(f, "{}", raw),
            Expiration::Unknown => write!(f, "{}", SENTINEL),
        }
    }
}

/// Enriched registration data for one successfully queried domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    pub domain: String,

    /// Registrar name, at most 20 characters
    pub registrar: String,

    pub expiration: Expiration,

    /// Whole days until expiration; negative once expired
    pub days_remaining: Option<i64>,

    pub asn: String,

    /// Comma-joined IPv4 addresses
    pub ipv4: String,

    /// Comma-joined IPv6 addresses
    pub ipv6: String,

    /// Upper-cased country code
    pub country: String,
}

impl DomainRecord {
    /// A record with every field set to its sentinel.
    pub fn empty(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            registrar: SENTINEL.to_string(),
            expiration: Expiration::Unknown,
            days_remaining: None,
            asn: SENTINEL.to_string(),
            ipv4: SENTINEL.to_string(),
            ipv6: SENTINEL.to_string(),
            country: SENTINEL.to_string(),
        }
    }
}

/// A domain whose every attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    pub domain: String,
    pub error_message: String,
    pub attempts_made: usize,
}

/// Outcome of processing one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Success(DomainRecord),
    Failure(QueryFailure),
}

impl QueryResult {
    /// The domain this result belongs to.
    pub fn domain(&self) -> &str {
        match self {
            QueryResult::Success(record) => &record.domain,
            QueryResult::Failure(failure) => &failure.domain,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    /// Flatten into the fixed-shape row used by the formatters.
    pub fn to_row(&self) -> ResultRow {
        match self {
            QueryResult::Success(record) => ResultRow {
                domain: record.domain.clone(),
                registrar: record.registrar.clone(),
                expires: record.expiration.to_string(),
                days_left: record
                    .days_remaining
                    .map(|days| days.to_string())
                    .unwrap_or_else(|| SENTINEL.to_string()),
                status: "success".to_string(),
                error: String::new(),
                asn: record.asn.clone(),
                ipv4: record.ipv4.clone(),
                ipv6: record.ipv6.clone(),
                country: record.country.clone(),
            },
            QueryResult::Failure(failure) => ResultRow {
                domain: failure.domain.clone(),
                registrar: FAILED_REGISTRAR.to_string(),
                expires: SENTINEL.to_string(),
                days_left: SENTINEL.to_string(),
                status: "failed".to_string(),
                error: failure.error_message.clone(),
                asn: SENTINEL.to_string(),
                ipv4: SENTINEL.to_string(),
                ipv6: SENTINEL.to_string(),
                country: SENTINEL.to_string(),
            },
        }
    }
}

/// Flat, string-only view of a [`QueryResult`].
///
/// Every column is always present so table, JSON and CSV output share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub domain: String,
    pub registrar: String,
    pub expires: String,
    pub days_left: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub asn: String,
    pub ipv4: String,
    pub ipv6: String,
    pub country: String,
}

/// Output format for displaying results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,

    /// Pretty-printed JSON array
    Json,

    /// Comma-separated values with a header row
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!(
                "Unknown output format '{}'. Use table, json or csv",
                other
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
