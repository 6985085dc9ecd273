//! Collaborators the query pipeline consumes.
//!
//! The pipeline only talks to the traits defined here, so every network and
//! parsing dependency can be swapped (or faked in tests) without touching it.

use async_trait::async_trait;
use std::net::IpAddr;

use crate::error::WhoisSweepError;

/// DNS lookups via hickory
pub mod dns;

/// Schema-aware extraction of domain fields from WHOIS text
pub mod parser;

/// Raw WHOIS fetches through the system `whois` command
pub mod whois;

pub use dns::DnsResolver;
pub use parser::{ParsedRecord, StructuredParser};
pub use whois::{is_whois_available, SystemWhois};

/// Fetches raw WHOIS text for a domain or an IP address.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    /// Returns the raw response text.
    ///
    /// Transport failures are errors; an empty successful response is `Ok("")`
    /// and left for the caller to classify.
    async fn query(&self, target: &str) -> Result<String, WhoisSweepError>;
}

/// Extracts named fields from raw WHOIS text.
pub trait RecordParser: Send + Sync {
    /// A failure means structured extraction was impossible, not that the text is invalid.
    fn parse(&self, text: &str) -> Result<ParsedRecord, WhoisSweepError>;
}

/// Forward address and TXT lookups.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// All addresses of `host`, both families.
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, WhoisSweepError>;

    /// TXT record strings for `name`.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, WhoisSweepError>;
}
