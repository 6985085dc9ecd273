//! Heuristic field extraction from free-form WHOIS text.
//!
//! Structured parsers routinely miss fields that registries print under
//! non-standard labels, and IP WHOIS output has no common schema at all.
//! The routines here scan the raw text line by line for known labels.
//!
//! Label lists live behind the [`ResponseDialect`] trait so other response
//! dialects can be plugged into the pipeline without touching it.

use crate::types::SENTINEL;

/// Labels that introduce an origin AS number, matched case-insensitively anywhere in a line.
const ASN_LABELS: &[&str] = &[
    "asn:",
    "as number:",
    "autonomous system:",
    "origin as:",
    "originas:",
    "origin:",
    "asnum:",
    "aut-num:",
];

const COUNTRY_LABELS: &[&str] = &["country:", "registrant country:"];

/// Matched at the start of a line.
const REGISTRAR_LABELS: &[&str] = &["registrar:", "registrar name:", "sponsoring registrar:"];

/// Matched at the start of a line.
const EXPIRATION_LABELS: &[&str] = &[
    "registry expiry date:",
    "registrar registration expiration date:",
    "expiration date:",
    "expiry date:",
    "expires on:",
    "expires:",
    "paid-till:",
    "expiration time:",
];

/// Characters stripped from both ends of a candidate AS token.
const TOKEN_PUNCTUATION: &[char] = &['(', ')', ',', '[', ']', '"', '\''];

/// Bare integers must fall strictly below this to count as an AS number.
const BARE_ASN_LIMIT: u64 = 400_000;

/// A strategy for pulling loosely structured fields out of WHOIS text.
pub trait ResponseDialect: Send + Sync {
    /// Origin AS number as `AS<digits>`.
    fn extract_asn(&self, raw: &str) -> Option<String>;

    /// Upper-cased country code.
    fn extract_country(&self, raw: &str) -> Option<String>;

    /// Registrar name as printed.
    fn extract_registrar(&self, raw: &str) -> Option<String>;

    /// Unparsed expiration timestamp.
    fn extract_expiration(&self, raw: &str) -> Option<String>;
}

/// Label lists covering gTLD registries and the regional internet registries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDialect;

impl ResponseDialect for DefaultDialect {
    fn extract_asn(&self, raw: &str) -> Option<String> {
        for line in raw.lines() {
            let original = line.trim();
            let lower = original.to_ascii_lowercase();

            if !ASN_LABELS.iter().any(|label| lower.contains(label)) {
                continue;
            }

            // Value between the first and second colon, then anything on the line
            if let Some(value) = original.split(':').nth(1) {
                if let Some(asn) = value.split_whitespace().find_map(extract_as_number) {
                    return Some(asn);
                }
            }

            if let Some(asn) = original.split_whitespace().find_map(extract_as_number) {
                return Some(asn);
            }
        }

        None
    }

    fn extract_country(&self, raw: &str) -> Option<String> {
        raw.lines().find_map(|line| {
            let lower = line.trim().to_ascii_lowercase();
            if !COUNTRY_LABELS.iter().any(|label| lower.contains(label)) {
                return None;
            }
            let (_, rest) = lower.split_once(':')?;
            let country = rest.trim();
            (!country.is_empty()).then(|| country.to_uppercase())
        })
    }

    fn extract_registrar(&self, raw: &str) -> Option<String> {
        find_labelled_value(raw, REGISTRAR_LABELS)
    }

    fn extract_expiration(&self, raw: &str) -> Option<String> {
        find_labelled_value(raw, EXPIRATION_LABELS)
    }
}

/// First non-empty value whose line starts with one of `labels`.
fn find_labelled_value(raw: &str, labels: &[&str]) -> Option<String> {
    raw.lines().find_map(|line| {
        let original = line.trim();
        let lower = original.to_ascii_lowercase();
        let label = labels.iter().find(|label| lower.starts_with(*label))?;
        let value = original.get(label.len()..)?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Interpret a single token as an AS number.
///
/// `AS`-prefixed tokens are accepted at any magnitude; bare integers only
/// when in `(0, 400000)`. Surrounding brackets, commas and quotes are ignored.
///
/// ```
/// use whois_sweep_lib::extract_as_number;
///
/// assert_eq!(extract_as_number("AS15169").as_deref(), Some("AS15169"));
/// assert_eq!(extract_as_number("(15169)").as_deref(), Some("AS15169"));
/// assert_eq!(extract_as_number("400001"), None);
/// ```
pub fn extract_as_number(token: &str) -> Option<String> {
    let token = token.trim().trim_matches(TOKEN_PUNCTUATION);

    if let Some(prefix) = token.get(..2) {
        if prefix.eq_ignore_ascii_case("as") && token.len() > 2 {
            let digits = &token[2..];
            if is_all_digits(digits) && digits.parse::<u64>().is_ok() {
                return Some(format!("AS{}", digits));
            }
        }
    }

    if is_all_digits(token) {
        if let Ok(number) = token.parse::<u64>() {
            if number > 0 && number < BARE_ASN_LIMIT {
                return Some(format!("AS{}", token));
            }
        }
    }

    None
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Origin AS number from raw IP WHOIS text, or the sentinel.
pub fn extract_asn(raw: &str) -> String {
    DefaultDialect
        .extract_asn(raw)
        .unwrap_or_else(|| SENTINEL.to_string())
}

/// Country code from raw WHOIS text, or the sentinel.
pub fn extract_country(raw: &str) -> String {
    DefaultDialect
        .extract_country(raw)
        .unwrap_or_else(|| SENTINEL.to_string())
}
