//! Single-domain query and enrichment.
//!
//! This module provides the `QueryExecutor` that turns one domain name into
//! a `DomainRecord`: WHOIS fetch, structured parse with heuristic fallback,
//! optional address and ASN lookups, and expiration normalization.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::asn::AsnResolver;
use crate::dates;
use crate::error::WhoisSweepError;
use crate::heuristics::{DefaultDialect, ResponseDialect};
use crate::protocols::{
    DnsResolver, HostResolver, RecordParser, StructuredParser, SystemWhois, WhoisSource,
};
use crate::types::{DomainRecord, Expiration, QueryOptions, SweepConfig, SENTINEL};
use crate::utils::{join_or_sentinel, truncate_expiration, truncate_registrar};

/// Performs the full enrichment of one domain.
///
/// Cheap to clone: every collaborator is shared behind an `Arc`, so one
/// executor can be handed to any number of concurrent workers.
///
/// # Example
///
/// ```rust,no_run
/// use whois_sweep_lib::{QueryExecutor, SweepConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let executor = QueryExecutor::new(&SweepConfig::default().with_asn(true));
///     let record = executor.query("example.com").await?;
///     println!("{} expires {}", record.domain, record.expiration);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct QueryExecutor {
    options: QueryOptions,
    whois: Arc<dyn WhoisSource>,
    parser: Arc<dyn RecordParser>,
    resolver: Arc<dyn HostResolver>,
    dialect: Arc<dyn ResponseDialect>,
    asn: AsnResolver,
}

impl QueryExecutor {
    /// Create an executor using the system `whois` command and DNS resolver.
    pub fn new(config: &SweepConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(SystemWhois::with_timeout(config.whois_timeout)),
            Arc::new(StructuredParser::new()),
            Arc::new(DnsResolver::new(config.dns_timeout)),
        )
    }

    /// Create an executor with explicit collaborators and the default dialect.
    pub fn with_collaborators(
        config: &SweepConfig,
        whois: Arc<dyn WhoisSource>,
        parser: Arc<dyn RecordParser>,
        resolver: Arc<dyn HostResolver>,
    ) -> Self {
        let dialect: Arc<dyn ResponseDialect> = Arc::new(DefaultDialect);
        let asn = AsnResolver::new(
            Arc::clone(&resolver),
            Arc::clone(&whois),
            Arc::clone(&dialect),
            config.asn_timeout,
        );

        Self {
            options: config.options,
            whois,
            parser,
            resolver,
            dialect,
            asn,
        }
    }

    /// Replace the heuristic dialect used for fallback extraction and ASN scanning.
    pub fn with_dialect(mut self, dialect: Arc<dyn ResponseDialect>, config: &SweepConfig) -> Self {
        self.asn = AsnResolver::new(
            Arc::clone(&self.resolver),
            Arc::clone(&self.whois),
            Arc::clone(&dialect),
            config.asn_timeout,
        );
        self.dialect = dialect;
        self
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// Query and enrich one domain.
    ///
    /// # Errors
    ///
    /// Only the WHOIS fetch, an empty response and a rejected structured
    /// parse are errors. Enrichment failures degrade the affected field to
    /// the sentinel.
    #[instrument(skip(self), fields(domain = %domain))]
    pub async fn query(&self, domain: &str) -> Result<DomainRecord, WhoisSweepError> {
        let raw = self.whois.query(domain).await?;
        if raw.trim().is_empty() {
            return Err(WhoisSweepError::empty_response(domain));
        }

        let parsed = self.parser.parse(&raw)?;

        let registrar = non_empty(parsed.registrar)
            .or_else(|| self.dialect.extract_registrar(&raw))
            .map(|name| truncate_registrar(&name))
            .unwrap_or_else(|| SENTINEL.to_string());

        let (expiration, days_remaining) = match non_empty(parsed.expiration_date)
            .or_else(|| self.dialect.extract_expiration(&raw))
        {
            Some(raw_expiration) => match dates::normalize(&raw_expiration) {
                Ok(normalized) => (
                    Expiration::Date(normalized.date),
                    Some(normalized.days_remaining),
                ),
                Err(e) => {
                    debug!(error = %e, "Expiration not normalized, showing raw prefix");
                    (Expiration::Raw(truncate_expiration(&raw_expiration)), None)
                }
            },
            None => (Expiration::Unknown, None),
        };

        let (asn, (ipv4, ipv6)) = tokio::join!(self.lookup_asn(domain), self.lookup_addresses(domain));

        let country = self
            .dialect
            .extract_country(&raw)
            .unwrap_or_else(|| SENTINEL.to_string());

        Ok(DomainRecord {
            domain: domain.to_string(),
            registrar,
            expiration,
            days_remaining,
            asn,
            ipv4,
            ipv6,
            country,
        })
    }

    async fn lookup_asn(&self, domain: &str) -> String {
        if !self.options.include_asn {
            return SENTINEL.to_string();
        }
        self.asn.resolve(domain).await
    }

    /// Requested address families, comma-joined; each falls back to the sentinel.
    async fn lookup_addresses(&self, domain: &str) -> (String, String) {
        if !self.options.wants_addresses() {
            return (SENTINEL.to_string(), SENTINEL.to_string());
        }

        let addresses = match self.resolver.lookup_ip(domain).await {
            Ok(addresses) => addresses,
            Err(e) => {
                debug!(error = %e, "Address lookup failed");
                Vec::new()
            }
        };

        let (v4, v6): (Vec<IpAddr>, Vec<IpAddr>) =
            addresses.into_iter().partition(IpAddr::is_ipv4);

        let ipv4 = if self.options.include_ipv4 {
            join_or_sentinel(&v4)
        } else {
            SENTINEL.to_string()
        };
        let ipv6 = if self.options.include_ipv6 {
            join_or_sentinel(&v6)
        } else {
            SENTINEL.to_string()
        };

        (ipv4, ipv6)
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("options", &self.options)
            .field("asn", &self.asn)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
