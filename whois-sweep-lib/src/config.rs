//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, and merging them with proper precedence rules:
//! built-in defaults, then config files, then `WSW_*` variables, then CLI flags.

use crate::error::WhoisSweepError;
use crate::types::{OutputFormat, SweepConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// workers = 5
/// retry = 3
/// delay_ms = 500
/// asn = true
/// whois_timeout = "30s"
///
/// [output]
/// format = "csv"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for sweep options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Number of concurrent workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Retries after a failed query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<usize>,

    /// Pause after each domain, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<bool>,

    /// WHOIS fetch timeout (as string, e.g., "15s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_timeout: Option<String>,

    /// DNS lookup timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_timeout: Option<String>,

    /// ASN fallback timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn_timeout: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Default output format: "table", "json" or "csv"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FileConfig {
    /// Overlay the file's defaults onto `config`.
    ///
    /// Timeouts are validated on load, so unparseable values cannot reach here.
    pub fn apply_to(&self, mut config: SweepConfig) -> SweepConfig {
        let Some(defaults) = &self.defaults else {
            return config;
        };

        if let Some(workers) = defaults.workers {
            config = config.with_workers(workers);
        }
        if let Some(retry) = defaults.retry {
            config = config.with_retries(retry);
        }
        if let Some(delay_ms) = defaults.delay_ms {
            config = config.with_delay(Duration::from_millis(delay_ms));
        }
        if let Some(asn) = defaults.asn {
            config = config.with_asn(asn);
        }
        if let Some(ipv4) = defaults.ipv4 {
            config = config.with_ipv4(ipv4);
        }
        if let Some(ipv6) = defaults.ipv6 {
            config = config.with_ipv6(ipv6);
        }
        if let Some(timeout) = defaults.whois_timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_whois_timeout(timeout);
        }
        if let Some(timeout) = defaults.dns_timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_dns_timeout(timeout);
        }
        if let Some(timeout) = defaults.asn_timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_asn_timeout(timeout);
        }

        config
    }

    /// Output format named in the `[output]` section, if any.
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output
            .as_ref()
            .and_then(|output| output.format.as_deref())
            .and_then(|format| format.parse().ok())
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, WhoisSweepError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WhoisSweepError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WhoisSweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config first, then the home directory, then the current
    /// directory; later files override earlier ones field by field.
    pub fn discover_and_load(&self) -> Result<FileConfig, WhoisSweepError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring config file"),
            }
        }

        if self.verbose {
            for path in &loaded_files {
                info!(path = %path.display(), "Loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./whois-sweep.toml", "./.whois-sweep.toml"];

        candidates
            .into_iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".whois-sweep.toml", "whois-sweep.toml"];

        candidates
            .into_iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whois-sweep").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    workers: higher_defaults.workers.or(lower_defaults.workers),
                    retry: higher_defaults.retry.or(lower_defaults.retry),
                    delay_ms: higher_defaults.delay_ms.or(lower_defaults.delay_ms),
                    asn: higher_defaults.asn.or(lower_defaults.asn),
                    ipv4: higher_defaults.ipv4.or(lower_defaults.ipv4),
                    ipv6: higher_defaults.ipv6.or(lower_defaults.ipv6),
                    whois_timeout: higher_defaults.whois_timeout.or(lower_defaults.whois_timeout),
                    dns_timeout: higher_defaults.dns_timeout.or(lower_defaults.dns_timeout),
                    asn_timeout: higher_defaults.asn_timeout.or(lower_defaults.asn_timeout),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            output: higher.output.or(lower.output),
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), WhoisSweepError> {
        if let Some(defaults) = &config.defaults {
            if let Some(workers) = defaults.workers {
                if workers == 0 || workers > 100 {
                    return Err(WhoisSweepError::config("Workers must be between 1 and 100"));
                }
            }

            let timeouts = [
                ("whois_timeout", &defaults.whois_timeout),
                ("dns_timeout", &defaults.dns_timeout),
                ("asn_timeout", &defaults.asn_timeout),
            ];
            for (name, value) in timeouts {
                if let Some(timeout_str) = value {
                    if parse_timeout_string(timeout_str).is_none() {
                        return Err(WhoisSweepError::config(format!(
                            "Invalid {} format '{}'. Use format like '5s', '30s', '2m'",
                            name, timeout_str
                        )));
                    }
                }
            }
        }

        if let Some(format) = config.output.as_ref().and_then(|o| o.format.as_deref()) {
            format
                .parse::<OutputFormat>()
                .map_err(WhoisSweepError::config)?;
        }

        Ok(())
    }
}

/// Configuration values set through `WSW_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub workers: Option<usize>,
    pub retry: Option<usize>,
    pub delay_ms: Option<u64>,
    pub asn: Option<bool>,
    pub ipv4: Option<bool>,
    pub ipv6: Option<bool>,
    pub whois_timeout: Option<Duration>,
    pub format: Option<OutputFormat>,
    /// Explicit config file path
    pub config: Option<String>,
}

impl EnvConfig {
    /// Overlay the environment values onto `config`.
    pub fn apply_to(&self, mut config: SweepConfig) -> SweepConfig {
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(retry) = self.retry {
            config = config.with_retries(retry);
        }
        if let Some(delay_ms) = self.delay_ms {
            config = config.with_delay(Duration::from_millis(delay_ms));
        }
        if let Some(asn) = self.asn {
            config = config.with_asn(asn);
        }
        if let Some(ipv4) = self.ipv4 {
            config = config.with_ipv4(ipv4);
        }
        if let Some(ipv6) = self.ipv6 {
            config = config.with_ipv6(ipv6);
        }
        if let Some(timeout) = self.whois_timeout {
            config = config.with_whois_timeout(timeout);
        }
        config
    }
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an [`EnvConfig`] from an arbitrary variable lookup.
pub fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("WSW_WORKERS") {
        match val.trim().parse::<usize>() {
            Ok(workers) if (1..=100).contains(&workers) => env_config.workers = Some(workers),
            _ => warn!("Invalid WSW_WORKERS='{}', must be 1-100", val),
        }
    }

    if let Some(val) = lookup("WSW_RETRY") {
        match val.trim().parse::<usize>() {
            Ok(retry) => env_config.retry = Some(retry),
            Err(_) => warn!("Invalid WSW_RETRY='{}', must be a non-negative integer", val),
        }
    }

    if let Some(val) = lookup("WSW_DELAY_MS") {
        match val.trim().parse::<u64>() {
            Ok(delay) => env_config.delay_ms = Some(delay),
            Err(_) => warn!("Invalid WSW_DELAY_MS='{}', must be milliseconds", val),
        }
    }

    env_config.asn = lookup_bool(&lookup, "WSW_ASN");
    env_config.ipv4 = lookup_bool(&lookup, "WSW_IPV4");
    env_config.ipv6 = lookup_bool(&lookup, "WSW_IPV6");

    if let Some(val) = lookup("WSW_WHOIS_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(timeout) => env_config.whois_timeout = Some(timeout),
            None => warn!("Invalid WSW_WHOIS_TIMEOUT='{}', use format like '5s', '2m'", val),
        }
    }

    if let Some(val) = lookup("WSW_FORMAT") {
        match val.parse::<OutputFormat>() {
            Ok(format) => env_config.format = Some(format),
            Err(e) => warn!("Invalid WSW_FORMAT: {}", e),
        }
    }

    if let Some(path) = lookup("WSW_CONFIG") {
        if !path.trim().is_empty() {
            env_config.config = Some(path);
        }
    }

    env_config
}

fn lookup_bool<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(key)?;
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => {
            warn!("Invalid {}='{}', use true or false", key, val);
            None
        }
    }
}

/// Parse a timeout string like "5s", "30s", "2m".
///
/// A bare number is read as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let seconds = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }?;

    Some(Duration::from_secs(seconds))
}
