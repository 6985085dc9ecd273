//! Error handling for WHOIS sweep operations.
//!
//! This module defines the error type shared by the collaborators, the query
//! pipeline and the configuration layer. Only fetch, empty-response and parse
//! failures ever reach a caller as a failed query; everything else is absorbed
//! into sentinel values by the pipeline.

use std::fmt;
use std::time::Duration;

/// Main error type for WHOIS sweep operations.
#[derive(Debug, Clone)]
pub enum WhoisSweepError {
    /// The WHOIS fetch itself failed (process spawn, exit, decode).
    Transport { target: String, message: String },

    /// The WHOIS fetch succeeded but returned nothing but whitespace.
    EmptyResponse { target: String },

    /// Structured parsing or date normalization rejected the text.
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// An operation exceeded its time bound.
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// DNS lookup failed or returned nothing usable.
    Resolution { name: String, message: String },

    /// Invalid configuration values (file, environment or builder).
    ConfigError { message: String },

    /// File I/O errors when reading config files or domain lists.
    FileError { path: String, message: String },

    /// Anything that doesn't fit the categories above.
    Internal { message: String },
}

impl WhoisSweepError {
    /// Create a new transport error.
    pub fn transport<T: Into<String>, M: Into<String>>(target: T, message: M) -> Self {
        Self::Transport {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a new empty-response error.
    pub fn empty_response<T: Into<String>>(target: T) -> Self {
        Self::EmptyResponse {
            target: target.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new parse error keeping the offending input around.
    pub fn parse_with_content<M: Into<String>, C: Into<String>>(message: M, content: C) -> Self {
        Self::ParseError {
            message: message.into(),
            content: Some(content.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new resolution error.
    pub fn resolution<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self::Resolution {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error looks transient.
    ///
    /// The retry controller retries every failure kind; this is used for
    /// log levels and by callers that want to be pickier.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::EmptyResponse { .. } | Self::Timeout { .. }
        )
    }
}

impl fmt::Display for WhoisSweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { target, message } => {
                write!(f, "WHOIS query failed for '{}': {}", target, message)
            }
            Self::EmptyResponse { target } => {
                write!(f, "WHOIS query returned empty result for '{}'", target)
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "WHOIS parsing failed: {}", message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Resolution { name, message } => {
                write!(f, "DNS resolution failed for '{}': {}", name, message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for WhoisSweepError {}

impl From<std::io::Error> for WhoisSweepError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<hickory_resolver::error::ResolveError> for WhoisSweepError {
    fn from(err: hickory_resolver::error::ResolveError) -> Self {
        Self::Resolution {
            name: "unknown".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WhoisSweepError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let empty = WhoisSweepError::empty_response("example.com");
        assert!(empty.to_string().contains("empty result"));

        let parse = WhoisSweepError::parse("domain not found");
        assert_eq!(parse.to_string(), "WHOIS parsing failed: domain not found");

        let transport = WhoisSweepError::transport("example.com", "connection refused");
        assert!(transport.to_string().starts_with("WHOIS query failed"));
        assert!(transport.to_string().contains("connection refused"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(WhoisSweepError::transport("a.com", "reset").is_retryable());
        assert!(WhoisSweepError::empty_response("a.com").is_retryable());
        assert!(WhoisSweepError::timeout("whois", Duration::from_secs(1)).is_retryable());
        assert!(!WhoisSweepError::parse("bad").is_retryable());
        assert!(!WhoisSweepError::config("bad").is_retryable());
    }
}
