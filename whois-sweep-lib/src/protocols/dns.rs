use async_trait::async_trait;
use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

use super::HostResolver;
use crate::error::WhoisSweepError;

/// [`HostResolver`] backed by hickory's tokio resolver.
///
/// Uses the system resolver configuration, falling back to Google's public
/// resolvers when it cannot be read. Every lookup is bounded by `timeout`.
#[derive(Clone)]
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsResolver {
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
            Ok(system) => system,
            Err(e) => {
                debug!(error = %e, "System resolver configuration unavailable, using Google DNS");
                (ResolverConfig::google(), ResolverOpts::default())
            }
        };
        opts.timeout = timeout;
        opts.attempts = 2;
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }

    async fn bounded<T, F>(&self, name: &str, lookup: F) -> Result<T, WhoisSweepError>
    where
        F: Future<Output = Result<T, hickory_resolver::error::ResolveError>>,
    {
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(WhoisSweepError::resolution(name, e.to_string())),
            Err(_) => Err(WhoisSweepError::timeout(
                format!("DNS lookup for {}", name),
                self.timeout,
            )),
        }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl std::fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HostResolver for DnsResolver {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, WhoisSweepError> {
        let lookup = self.bounded(host, self.resolver.lookup_ip(host)).await?;
        let addresses: Vec<IpAddr> = lookup.iter().collect();

        if addresses.is_empty() {
            return Err(WhoisSweepError::resolution(host, "no addresses returned"));
        }
        Ok(addresses)
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, WhoisSweepError> {
        let lookup = self.bounded(name, self.resolver.txt_lookup(name)).await?;
        let records: Vec<String> = lookup.iter().map(|txt| txt.to_string()).collect();

        if records.is_empty() {
            return Err(WhoisSweepError::resolution(name, "no TXT records returned"));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolver_construction() {
        let resolver = DnsResolver::new(Duration::from_secs(2));
        assert_eq!(resolver.timeout, Duration::from_secs(2));
        assert!(format!("{:?}", resolver).contains("DnsResolver"));
    }

    #[tokio::test]
    async fn test_invalid_name_is_an_error() {
        let resolver = DnsResolver::new(Duration::from_secs(2));
        // The .invalid TLD is reserved and never resolves
        assert!(resolver.lookup_ip("whois-sweep.invalid").await.is_err());
    }
}
