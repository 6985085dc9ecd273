//! Schema-aware extraction of domain fields from WHOIS text.
//!
//! Registries print `key: value` lines under a handful of well-known keys.
//! This parser maps those keys onto [`ParsedRecord`] and reports responses
//! that carry no domain data at all as errors.

use super::RecordParser;
use crate::error::WhoisSweepError;

/// Responses that state the domain is not registered.
const NOT_FOUND_PATTERNS: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "domain not found",
    "no information available",
    "not registered",
    "no matching record",
    "no object found",
    "object does not exist",
    "no matching entry",
    "domain name not found",
    "this domain name has not been registered",
];

const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "try again later",
    "quota exceeded",
    "limit exceeded",
    "throttled",
    "rate-limited",
];

/// Named fields extracted from a WHOIS response.
///
/// Empty strings mean the field was not present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    pub domain_name: String,
    pub registrar: String,
    pub expiration_date: String,
    pub creation_date: String,
    pub updated_date: String,
    pub name_servers: Vec<String>,
    pub status: Vec<String>,
}

impl ParsedRecord {
    fn has_domain_data(&self) -> bool {
        !self.domain_name.is_empty()
            || !self.registrar.is_empty()
            || !self.expiration_date.is_empty()
            || !self.creation_date.is_empty()
    }
}

/// Default [`RecordParser`] for gTLD-style `key: value` responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredParser;

impl StructuredParser {
    pub fn new() -> Self {
        Self
    }
}

impl RecordParser for StructuredParser {
    fn parse(&self, text: &str) -> Result<ParsedRecord, WhoisSweepError> {
        let mut record = ParsedRecord::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
                continue;
            }
            // Trailer such as ">>> Last update of WHOIS database: ... <<<"
            if line.starts_with(">>>") {
                break;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match normalize_key(key).as_str() {
                "domain name" | "domain" => set_once(&mut record.domain_name, value),
                "registrar" | "registrar name" | "sponsoring registrar" => {
                    set_once(&mut record.registrar, value)
                }
                "registry expiry date"
                | "registrar registration expiration date"
                | "expiration date"
                | "expiry date"
                | "expires on"
                | "expires"
                | "paid-till"
                | "expiration time" => set_once(&mut record.expiration_date, value),
                "creation date" | "created" | "registered on" | "registration time" => {
                    set_once(&mut record.creation_date, value)
                }
                "updated date" | "last updated" | "last modified" | "changed" => {
                    set_once(&mut record.updated_date, value)
                }
                "name server" | "nserver" | "nameserver" => {
                    record.name_servers.push(value.to_ascii_lowercase())
                }
                "domain status" | "status" => {
                    let status = value.split_whitespace().next().unwrap_or(value);
                    record.status.push(status.to_string());
                }
                _ => {}
            }
        }

        if record.has_domain_data() {
            return Ok(record);
        }

        let lower = text.to_lowercase();
        if NOT_FOUND_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Err(WhoisSweepError::parse("domain not found"));
        }
        if RATE_LIMIT_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Err(WhoisSweepError::parse("rate limited"));
        }

        Err(WhoisSweepError::parse_with_content(
            "domain data invalid",
            text.chars().take(200).collect::<String>(),
        ))
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

fn set_once(field: &mut String, value: &str) {
    if field.is_empty() {
        *field = value.to_string();
    }
}
