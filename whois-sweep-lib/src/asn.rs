//! Origin ASN resolution for a domain.
//!
//! The domain's first IPv4 address is looked up against the Team Cymru
//! IP-to-ASN DNS zone. Ranges missing from that zone fall back to a WHOIS
//! query on the address itself, scanned with the heuristic ASN extractor.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::WhoisSweepError;
use crate::heuristics::ResponseDialect;
use crate::protocols::{HostResolver, WhoisSource};
use crate::types::SENTINEL;

/// DNS zone answering `<d>.<c>.<b>.<a>.origin.asn.cymru.com` TXT queries.
pub const CYMRU_ORIGIN_ZONE: &str = "origin.asn.cymru.com";

/// Resolves the origin AS number of a domain's first IPv4 address.
#[derive(Clone)]
pub struct AsnResolver {
    resolver: Arc<dyn HostResolver>,
    whois: Arc<dyn WhoisSource>,
    dialect: Arc<dyn ResponseDialect>,
    /// Ceiling for the WHOIS fallback
    fallback_timeout: Duration,
}

impl AsnResolver {
    pub fn new(
        resolver: Arc<dyn HostResolver>,
        whois: Arc<dyn WhoisSource>,
        dialect: Arc<dyn ResponseDialect>,
        fallback_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            whois,
            dialect,
            fallback_timeout,
        }
    }

    /// `AS<n>` for the domain, or the sentinel on any failure.
    pub async fn resolve(&self, domain: &str) -> String {
        let ip = match self.first_ipv4(domain).await {
            Ok(ip) => ip,
            Err(e) => {
                debug!(domain = %domain, error = %e, "No IPv4 address for ASN lookup");
                return SENTINEL.to_string();
            }
        };

        match self.lookup_origin_txt(ip).await {
            Ok(asn) => return asn,
            Err(e) => debug!(ip = %ip, error = %e, "ASN TXT lookup failed, falling back to WHOIS"),
        }

        match self.lookup_via_whois(ip).await {
            Ok(asn) => asn,
            Err(e) => {
                debug!(ip = %ip, error = %e, "ASN WHOIS fallback failed");
                SENTINEL.to_string()
            }
        }
    }

    async fn first_ipv4(&self, domain: &str) -> Result<Ipv4Addr, WhoisSweepError> {
        self.resolver
            .lookup_ip(domain)
            .await?
            .into_iter()
            .find_map(|ip| match ip {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| WhoisSweepError::resolution(domain, "no IPv4 address"))
    }

    /// Fast path: the first field of a Cymru TXT record, e.g. `"15169 | 8.8.8.0/24 | US | arin | 2023-12-28"`.
    async fn lookup_origin_txt(&self, ip: Ipv4Addr) -> Result<String, WhoisSweepError> {
        let name = reverse_lookup_name(ip);
        let records = self.resolver.lookup_txt(&name).await?;

        records
            .iter()
            .find_map(|record| {
                let field = record.split_whitespace().next()?.trim_matches('"');
                let number: u64 = field.parse().ok()?;
                Some(format!("AS{}", number))
            })
            .ok_or_else(|| WhoisSweepError::resolution(name, "no ASN in TXT record"))
    }

    /// Fallback: WHOIS on the address, on its own task, raced against the timeout.
    async fn lookup_via_whois(&self, ip: Ipv4Addr) -> Result<String, WhoisSweepError> {
        let whois = Arc::clone(&self.whois);
        let target = ip.to_string();
        let mut task = tokio::spawn(async move { whois.query(&target).await });

        let raw = match tokio::time::timeout(self.fallback_timeout, &mut task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                return Err(WhoisSweepError::internal(format!(
                    "ASN WHOIS task failed: {}",
                    join_error
                )))
            }
            Err(_) => {
                // Dropping the query future kills the child process
                task.abort();
                return Err(WhoisSweepError::timeout(
                    format!("ASN WHOIS query for {}", ip),
                    self.fallback_timeout,
                ));
            }
        };

        self.dialect
            .extract_asn(&raw)
            .ok_or_else(|| WhoisSweepError::parse(format!("no ASN in WHOIS response for {}", ip)))
    }
}

impl std::fmt::Debug for AsnResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsnResolver")
            .field("fallback_timeout", &self.fallback_timeout)
            .finish_non_exhaustive()
    }
}

/// Cymru query name for an address: octets reversed under [`CYMRU_ORIGIN_ZONE`].
pub fn reverse_lookup_name(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{}.{}.{}.{}.{}", d, c, b, a, CYMRU_ORIGIN_ZONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::DefaultDialect;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeResolver {
        ips: HashMap<String, Vec<IpAddr>>,
        txt: HashMap<String, Vec<String>>,
    }

    #[async_trait]
    impl HostResolver for FakeResolver {
        async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, WhoisSweepError> {
            self.ips
                .get(host)
                .cloned()
                .ok_or_else(|| WhoisSweepError::resolution(host, "NXDOMAIN"))
        }

        async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, WhoisSweepError> {
            self.txt
                .get(name)
                .cloned()
                .ok_or_else(|| WhoisSweepError::resolution(name, "NXDOMAIN"))
        }
    }

    struct FakeWhois {
        response: String,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeWhois {
        fn new(response: &str, delay: Duration) -> Self {
            Self {
                response: response.to_string(),
                delay,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WhoisSource for FakeWhois {
        async fn query(&self, _target: &str) -> Result<String, WhoisSweepError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.response.clone())
        }
    }

    fn resolver_with(dns: FakeResolver, whois: Arc<FakeWhois>) -> AsnResolver {
        AsnResolver::new(
            Arc::new(dns),
            whois,
            Arc::new(DefaultDialect),
            Duration::from_secs(10),
        )
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_reverse_lookup_name() {
        assert_eq!(
            reverse_lookup_name(Ipv4Addr::new(8, 8, 4, 1)),
            "1.4.8.8.origin.asn.cymru.com"
        );
    }

    #[tokio::test]
    async fn test_fast_path_skips_whois() {
        let mut dns = FakeResolver::default();
        dns.ips.insert(
            "example.com".into(),
            vec![ip("2001:db8::1"), ip("93.184.215.14")],
        );
        dns.txt.insert(
            "14.215.184.93.origin.asn.cymru.com".into(),
            vec!["\"15133 | 93.184.215.0/24 | EU | ripencc | 2008-06-02\"".into()],
        );
        let whois = Arc::new(FakeWhois::new("origin: AS1\n", Duration::ZERO));

        let asn = resolver_with(dns, whois.clone()).resolve("example.com").await;
        assert_eq!(asn, "AS15133");
        assert_eq!(whois.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_whois_on_ip() {
        let mut dns = FakeResolver::default();
        dns.ips.insert("example.org".into(), vec![ip("192.0.2.10")]);
        let whois = Arc::new(FakeWhois::new(
            "NetRange: 192.0.2.0 - 192.0.2.255\nOriginAS: AS64496\n",
            Duration::ZERO,
        ));

        let asn = resolver_with(dns, whois.clone()).resolve("example.org").await;
        assert_eq!(asn, "AS64496");
        assert_eq!(whois.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unparseable_txt_falls_back() {
        let mut dns = FakeResolver::default();
        dns.ips.insert("example.net".into(), vec![ip("192.0.2.20")]);
        dns.txt.insert(
            "20.2.0.192.origin.asn.cymru.com".into(),
            vec!["NA | 192.0.2.0/24".into()],
        );
        let whois = Arc::new(FakeWhois::new("aut-num: AS64497\n", Duration::ZERO));

        let asn = resolver_with(dns, whois).resolve("example.net").await;
        assert_eq!(asn, "AS64497");
    }

    #[tokio::test]
    async fn test_ipv6_only_domain_yields_sentinel() {
        let mut dns = FakeResolver::default();
        dns.ips.insert("v6.example".into(), vec![ip("2001:db8::2")]);
        let whois = Arc::new(FakeWhois::new("origin: AS1\n", Duration::ZERO));

        let asn = resolver_with(dns, whois.clone()).resolve("v6.example").await;
        assert_eq!(asn, "-");
        assert_eq!(whois.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_domain_yields_sentinel() {
        let whois = Arc::new(FakeWhois::new("origin: AS1\n", Duration::ZERO));
        let asn = resolver_with(FakeResolver::default(), whois)
            .resolve("nope.invalid")
            .await;
        assert_eq!(asn, "-");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_whois_fallback_times_out() {
        let mut dns = FakeResolver::default();
        dns.ips.insert("slow.example".into(), vec![ip("192.0.2.30")]);
        let whois = Arc::new(FakeWhois::new("origin: AS64498\n", Duration::from_secs(60)));

        let started = tokio::time::Instant::now();
        let asn = resolver_with(dns, whois).resolve("slow.example").await;
        assert_eq!(asn, "-");
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_whois_without_asn_yields_sentinel() {
        let mut dns = FakeResolver::default();
        dns.ips.insert("bare.example".into(), vec![ip("192.0.2.40")]);
        let whois = Arc::new(FakeWhois::new("inetnum: 192.0.2.0 - 192.0.2.255\n", Duration::ZERO));

        let asn = resolver_with(dns, whois).resolve("bare.example").await;
        assert_eq!(asn, "-");
    }
}
