// whois-sweep-lib/tests/integration.rs

//! Integration tests for whois-sweep-lib exports and the sweep pipeline.
//!
//! Every collaborator is faked so the sweep never leaves the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use whois_sweep_lib::{
    execute_with_retry, Dispatcher, Expiration, HostResolver, QueryExecutor, QueryResult,
    ResponseDialect, ResultRow, StructuredParser, SweepConfig, WhoisSource, WhoisSweepError,
    FAILED_REGISTRAR, SENTINEL,
};

/// Serves canned WHOIS text per target and counts calls.
#[derive(Default)]
struct CannedWhois {
    responses: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl CannedWhois {
    fn with(mut self, target: &str, text: &str) -> Self {
        self.responses.insert(target.to_string(), text.to_string());
        self
    }

    fn calls_for(&self, target: &str) -> usize {
        self.calls.lock().unwrap().get(target).copied().unwrap_or(0)
    }
}

#[async_trait]
impl WhoisSource for CannedWhois {
    async fn query(&self, target: &str) -> Result<String, WhoisSweepError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_insert(0) += 1;

        match self.responses.get(target) {
            Some(text) => Ok(text.clone()),
            None => Err(WhoisSweepError::transport(target, "connection refused")),
        }
    }
}

/// Fixed DNS answers keyed by name.
#[derive(Default)]
struct StaticDns {
    addresses: HashMap<String, Vec<IpAddr>>,
    txt: HashMap<String, Vec<String>>,
}

#[async_trait]
impl HostResolver for StaticDns {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, WhoisSweepError> {
        self.addresses
            .get(host)
            .cloned()
            .ok_or_else(|| WhoisSweepError::resolution(host, "no records"))
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, WhoisSweepError> {
        self.txt
            .get(name)
            .cloned()
            .ok_or_else(|| WhoisSweepError::resolution(name, "no records"))
    }
}

fn registration(domain: &str, registrar: &str, expiry: &str) -> String {
    format!(
        "Domain Name: {}\nRegistrar: {}\nRegistry Expiry Date: {}\nRegistrant Country: us\n",
        domain.to_uppercase(),
        registrar,
        expiry
    )
}

fn executor(config: &SweepConfig, whois: Arc<CannedWhois>, dns: StaticDns) -> QueryExecutor {
    QueryExecutor::with_collaborators(config, whois, Arc::new(StructuredParser), Arc::new(dns))
}

fn rows(results: &[QueryResult]) -> Vec<ResultRow> {
    let mut rows: Vec<ResultRow> = results.iter().map(QueryResult::to_row).collect();
    rows.sort_by(|a, b| a.domain.cmp(&b.domain));
    rows
}

#[tokio::test]
async fn test_single_domain_end_to_end() {
    let whois = Arc::new(CannedWhois::default().with(
        "example.com",
        &registration("example.com", "Example Registrar LLC", "2030-01-01T00:00:00Z"),
    ));
    let config = SweepConfig::default().with_workers(1);
    let dispatcher =
        Dispatcher::with_executor(config.clone(), executor(&config, whois, StaticDns::default()));

    let results = dispatcher.run(&["example.com".to_string()]).await;
    assert_eq!(results.len(), 1);

    let row = &rows(&results)[0];
    assert_eq!(row.domain, "example.com");
    assert_eq!(row.registrar, "Example Registrar...");
    assert_eq!(row.expires, "2030-01-01");
    assert!(row.days_left.parse::<i64>().unwrap() > 0);
    assert_eq!(row.status, "success");
    assert_eq!(row.country, "US");
    assert!(row.error.is_empty());

    // Enrichment was not requested
    assert_eq!(row.asn, SENTINEL);
    assert_eq!(row.ipv4, SENTINEL);
    assert_eq!(row.ipv6, SENTINEL);
}

#[tokio::test(start_paused = true)]
async fn test_result_count_matches_input_for_any_worker_count() {
    let domains: Vec<String> = (0..12).map(|i| format!("site{}.example", i)).collect();

    // Every third domain has no WHOIS answer and fails
    let whois = domains
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 3 != 0)
        .fold(CannedWhois::default(), |whois, (_, domain)| {
            whois.with(domain, &registration(domain, "Registrar", "2031-06-30"))
        });
    let whois = Arc::new(whois);

    let mut outcomes = Vec::new();
    for workers in [1, 2, 4, 8] {
        let config = SweepConfig::default()
            .with_workers(workers)
            .with_retries(0)
            .with_delay(Duration::from_millis(10));
        let dispatcher = Dispatcher::with_executor(
            config.clone(),
            executor(&config, whois.clone(), StaticDns::default()),
        );

        let results = dispatcher.run(&domains).await;
        assert_eq!(results.len(), domains.len(), "workers = {}", workers);
        outcomes.push(rows(&results));
    }

    // The per-domain outcome does not depend on the worker count
    for outcome in &outcomes[1..] {
        assert_eq!(outcome, &outcomes[0]);
    }
    let failed = outcomes[0].iter().filter(|r| r.status == "failed").count();
    assert_eq!(failed, 4);
}

#[tokio::test(start_paused = true)]
async fn test_retries_then_reports_last_cause() {
    let whois = Arc::new(CannedWhois::default());
    let config = SweepConfig::default().with_retries(2).with_delay(Duration::from_millis(50));
    let executor = executor(&config, whois.clone(), StaticDns::default());

    let result = execute_with_retry(&executor, "down.example", 2, config.delay).await;
    assert_eq!(whois.calls_for("down.example"), 3);

    match result {
        QueryResult::Failure(failure) => {
            assert_eq!(failure.attempts_made, 3);
            assert!(failure.error_message.contains("failed after 3 attempts"));
            assert!(failure.error_message.contains("connection refused"));
        }
        QueryResult::Success(_) => panic!("expected a failure"),
    }
}

#[tokio::test]
async fn test_empty_response_becomes_failed_row() {
    let whois = Arc::new(CannedWhois::default().with("blank.example", "  \n\n"));
    let config = SweepConfig::default().with_retries(0).with_delay(Duration::ZERO);
    let dispatcher =
        Dispatcher::with_executor(config.clone(), executor(&config, whois, StaticDns::default()));

    let results = dispatcher.run(&["blank.example".to_string()]).await;
    let row = &rows(&results)[0];
    assert_eq!(row.status, "failed");
    assert_eq!(row.registrar, FAILED_REGISTRAR);
    assert_eq!(row.expires, SENTINEL);
    assert!(row.error.contains("empty result"));
}

#[tokio::test]
async fn test_enrichment_fills_asn_and_addresses() {
    let whois = Arc::new(CannedWhois::default().with(
        "example.net",
        &registration("example.net", "Example Registrar LLC", "2029-08-13"),
    ));

    let mut dns = StaticDns::default();
    dns.addresses.insert(
        "example.net".to_string(),
        vec![
            "93.184.215.14".parse().unwrap(),
            "2606:2800:21f:cb07:6820:80da:af6b:8b2c".parse().unwrap(),
        ],
    );
    dns.txt.insert(
        "14.215.184.93.origin.asn.cymru.com".to_string(),
        vec!["\"15133 | 93.184.215.0/24 | US | arin | 2008-06-02\"".to_string()],
    );

    let config = SweepConfig::default()
        .with_asn(true)
        .with_ipv4(true)
        .with_ipv6(true);
    let dispatcher = Dispatcher::with_executor(config.clone(), executor(&config, whois, dns));

    let results = dispatcher.run(&["example.net".to_string()]).await;
    let row = &rows(&results)[0];
    assert_eq!(row.status, "success");
    assert_eq!(row.asn, "AS15133");
    assert_eq!(row.ipv4, "93.184.215.14");
    assert_eq!(row.ipv6, "2606:2800:21f:cb07:6820:80da:af6b:8b2c");
}

/// Reads a registry format where labels use `=` instead of `:`.
struct EqualsDialect;

impl ResponseDialect for EqualsDialect {
    fn extract_asn(&self, _raw: &str) -> Option<String> {
        None
    }

    fn extract_country(&self, raw: &str) -> Option<String> {
        field(raw, "country")
    }

    fn extract_registrar(&self, raw: &str) -> Option<String> {
        field(raw, "sponsor")
    }

    fn extract_expiration(&self, raw: &str) -> Option<String> {
        field(raw, "valid-until")
    }
}

fn field(raw: &str, key: &str) -> Option<String> {
    raw.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim().to_string())
    })
}

#[tokio::test]
async fn test_custom_dialect_is_used_for_fallback_fields() {
    // Structured parse succeeds on the domain line; everything else comes from the dialect
    let text = "Domain Name: odd.example\nsponsor = Odd Registry Services\nvalid-until = 2032-02-29\ncountry = nz\n";
    let whois = Arc::new(CannedWhois::default().with("odd.example", text));
    let config = SweepConfig::default();
    let executor = executor(&config, whois, StaticDns::default())
        .with_dialect(Arc::new(EqualsDialect), &config);

    let record = executor.query("odd.example").await.unwrap();
    assert_eq!(record.registrar, "Odd Registry Serv...");
    assert_eq!(
        record.expiration,
        Expiration::Date(chrono::NaiveDate::from_ymd_opt(2032, 2, 29).unwrap())
    );
    assert_eq!(record.country, "NZ");
}

#[tokio::test]
async fn test_unparseable_expiration_is_shown_raw() {
    let whois = Arc::new(CannedWhois::default().with(
        "weird.example",
        &registration("weird.example", "Registrar", "sometime next spring"),
    ));
    let config = SweepConfig::default();
    let executor = executor(&config, whois, StaticDns::default());

    let record = executor.query("weird.example").await.unwrap();
    assert_eq!(record.expiration, Expiration::Raw("sometime n".to_string()));
    assert_eq!(record.days_remaining, None);
}

#[test]
fn test_library_exports_work() {
    assert!(!whois_sweep_lib::VERSION.is_empty());
    assert_eq!(
        whois_sweep_lib::parse_domain_list("a.example\n# c\n\n b.example "),
        vec!["a.example", "b.example"]
    );
    assert_eq!(whois_sweep_lib::truncate_registrar("Short"), "Short");
    assert_eq!(whois_sweep_lib::extract_country("Country: de"), "DE");
}
