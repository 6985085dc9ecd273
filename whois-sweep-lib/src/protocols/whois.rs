//! Raw WHOIS fetches for domains and IP addresses.
//!
//! WHOIS is the traditional protocol for registration data. Rather than
//! speaking it directly, this client shells out to the system's `whois`
//! tool, which already knows the referral chains for every registry and RIR.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::WhoisSource;
use crate::error::WhoisSweepError;

const DEFAULT_PROGRAM: &str = "whois";

/// WHOIS source backed by the system's `whois` command.
///
/// Each query runs in its own child process, bounded by a timeout. The child
/// is killed when the query future is dropped, so abandoning a query (on
/// timeout or task abort) never leaks a process or its connection.
#[derive(Debug, Clone)]
pub struct SystemWhois {
    /// Timeout for a single WHOIS request
    timeout: Duration,
    /// Executable to run
    program: String,
}

impl SystemWhois {
    /// Create a new WHOIS client with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Create a new WHOIS client with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::new()
        }
    }

    /// Use a different executable, e.g. a wrapper script or an absolute path.
    pub fn with_program<P: Into<String>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Execute the whois command and return its standard output.
    async fn execute_whois_command(&self, target: &str) -> Result<String, WhoisSweepError> {
        let output = Command::new(&self.program)
            .arg(target)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                WhoisSweepError::transport(
                    target,
                    format!(
                        "Failed to execute {} command: {}. Make sure 'whois' is installed.",
                        self.program, e
                    ),
                )
            })?;

        // Many whois builds exit non-zero for "no match" while still printing
        // a response, so only a silent failure counts as a transport error.
        if !output.status.success() && output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WhoisSweepError::transport(
                target,
                format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for SystemWhois {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhoisSource for SystemWhois {
    async fn query(&self, target: &str) -> Result<String, WhoisSweepError> {
        debug!(target = %target, program = %self.program, "Running WHOIS query");

        match tokio::time::timeout(self.timeout, self.execute_whois_command(target)).await {
            Ok(result) => result,
            Err(_) => Err(WhoisSweepError::timeout(
                format!("WHOIS query for {}", target),
                self.timeout,
            )),
        }
    }
}

/// Check if the system has a working whois command.
pub async fn is_whois_available() -> bool {
    match Command::new(DEFAULT_PROGRAM).arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
