//! Client configuration.
//!
//! Every field has a default, so a YAML file only needs the keys it overrides:
//!
//! ```yaml
//! api_url: https://api.example.com/
//! poll_interval_ms: 5000
//! ```

use crate::{client::Limits, RetryPolicy, Result};
use raspadinha_types::Amount;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Local simulator address.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL every endpoint path is joined onto.
    pub api_url: String,
    pub request_timeout_secs: u64,
    /// Attempts for idempotent requests, including the first.
    pub max_attempts: usize,
    pub min_deposit: Amount,
    pub min_withdrawal: Amount,
    pub poll_interval_ms: u64,
    /// Whether the balance poller also triggers the unprocessed deposit check.
    pub check_unprocessed_deposits: bool,
    pub payment_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            max_attempts: 1,
            min_deposit: Amount::from_reais(10),
            min_withdrawal: Amount::from_reais(20),
            poll_interval_ms: 5_000,
            check_unprocessed_deposits: true,
            payment_ttl_secs: 15 * 60,
        }
    }
}

impl Config {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn payment_ttl(&self) -> Duration {
        Duration::from_secs(self.payment_ttl_secs)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            min_deposit: self.min_deposit,
            min_withdrawal: self.min_withdrawal,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            ..RetryPolicy::default()
        }
    }
}
