//! Utility functions for domain input and display fields.
//!
//! This module contains helpers for reading domain lists and bounding
//! the width of values shown in the results table.

use crate::error::WhoisSweepError;
use crate::types::SENTINEL;

/// Registrar names longer than this are truncated.
pub const MAX_REGISTRAR_CHARS: usize = 20;

const REGISTRAR_KEEP_CHARS: usize = 17;
const ELLIPSIS: &str = "...";

/// Characters of an unparseable expiration shown as a best-effort date.
pub const RAW_EXPIRATION_CHARS: usize = 10;

/// Validate a domain input.
///
/// Domains are only required to be non-empty; anything else is left for
/// the WHOIS server to reject.
pub fn validate_domain(domain: &str) -> Result<(), WhoisSweepError> {
    if domain.trim().is_empty() {
        return Err(WhoisSweepError::config("Domain name cannot be empty"));
    }
    Ok(())
}

/// Parse a domain list, one per line.
///
/// Blank lines and `#` comments are skipped; surrounding whitespace is trimmed.
pub fn parse_domain_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Bound a registrar name to [`MAX_REGISTRAR_CHARS`] characters.
///
/// Longer names keep their first 17 characters followed by `...`.
pub fn truncate_registrar(registrar: &str) -> String {
    if registrar.chars().count() <= MAX_REGISTRAR_CHARS {
        return registrar.to_string();
    }
    let kept: String = registrar.chars().take(REGISTRAR_KEEP_CHARS).collect();
    format!("{}{}", kept, ELLIPSIS)
}

/// First [`RAW_EXPIRATION_CHARS`] characters of an unparseable expiration.
pub fn truncate_expiration(raw: &str) -> String {
    raw.trim().chars().take(RAW_EXPIRATION_CHARS).collect()
}

/// Comma-join display values, or the sentinel when there are none.
pub fn join_or_sentinel<T: ToString>(values: &[T]) -> String {
    if values.is_empty() {
        return SENTINEL.to_string();
    }
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
