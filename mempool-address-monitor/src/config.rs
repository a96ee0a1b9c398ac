// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Monitor configuration
//!
//! Loaded once at startup, validated, and passed to the monitor by value.
//! Two sources produce the same struct: a YAML file with `${VAR}`
//! substitution, or the legacy indexed environment variables
//! (`BITCOIN_ADDRESS_1`, `BITCOIN_ALIAS_1`, ...).

use crate::error::{MonitorError, MonitorResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MEMPOOL_API_URL: &str = "http://mempool.space/api";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// A watched address and its optional display alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedAddress {
    pub address: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl WatchedAddress {
    pub fn new(address: impl Into<String>, alias: Option<&str>) -> Self {
        Self {
            address: address.into(),
            alias: alias.map(str::to_string),
        }
    }

    /// Alias if configured, otherwise the raw address
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.address)
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub addresses: Vec<WatchedAddress>,
    #[serde(default = "default_mempool_api_url")]
    pub mempool_api_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default)]
    pub metrics: Option<MetricsPushConfig>,
}

fn default_mempool_api_url() -> String {
    DEFAULT_MEMPOOL_API_URL.to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_state_file() -> PathBuf {
    PathBuf::from("mempool_transactions.json")
}

impl MonitorConfig {
    /// Load configuration from YAML file with environment variable substitution
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read monitor config file: {:?}", path))?;

        let contents = substitute_env_vars(&contents)?;

        let config: MonitorConfig =
            serde_yaml::from_str(&contents).context("Failed to parse monitor config YAML")?;
        Ok(config)
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Addresses are read from `BITCOIN_ADDRESS_1`, `BITCOIN_ADDRESS_2`, ...
    /// and stop at the first missing or empty index.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut addresses = Vec::new();
        for index in 1.. {
            let Some(address) = non_empty(&format!("BITCOIN_ADDRESS_{}", index)) else {
                break;
            };
            let alias = non_empty(&format!("BITCOIN_ALIAS_{}", index));
            addresses.push(WatchedAddress { address, alias });
        }

        let metrics = non_empty("METRICS_PUSH_URL").map(|push_url| MetricsPushConfig {
            push_url,
            job_name: non_empty("METRICS_JOB_NAME").unwrap_or_else(default_job_name),
            auth_username: non_empty("METRICS_PUSH_USERNAME"),
            auth_password: lookup("METRICS_PUSH_PASSWORD").unwrap_or_default(),
        });

        Self {
            addresses,
            mempool_api_url: non_empty("MEMPOOL_API_URL").unwrap_or_else(default_mempool_api_url),
            request_timeout_seconds: non_empty("MEMPOOL_REQUEST_TIMEOUT")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or_else(default_request_timeout),
            telegram: TelegramConfig {
                bot_token: lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
                chat_id: non_empty("TELEGRAM_USER_ID")
                    .or_else(|| non_empty("TELEGRAM_CHAT_ID"))
                    .unwrap_or_default(),
                api_url: non_empty("TELEGRAM_API_URL").unwrap_or_else(default_telegram_api_url),
            },
            state_file: non_empty("TX_DATABASE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_state_file),
            metrics,
        }
    }

    /// Normalise and validate the address list.
    ///
    /// Addresses are trimmed, blank aliases become `None`, and the list must
    /// be non-empty with no duplicates.
    pub fn validate(mut self) -> MonitorResult<Self> {
        if self.addresses.is_empty() {
            return Err(MonitorError::Config(
                "no addresses configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (index, entry) in self.addresses.iter_mut().enumerate() {
            entry.address = entry.address.trim().to_string();
            if entry.address.is_empty() {
                return Err(MonitorError::Config(format!(
                    "address #{} is empty",
                    index + 1
                )));
            }
            entry.alias = entry
                .alias
                .take()
                .map(|alias| alias.trim().to_string())
                .filter(|alias| !alias.is_empty());
            if !seen.insert(entry.address.clone()) {
                return Err(MonitorError::Config(format!(
                    "address {} is configured more than once",
                    entry.address
                )));
            }
        }

        self.mempool_api_url = self.mempool_api_url.trim().trim_end_matches('/').to_string();
        if self.mempool_api_url.is_empty() {
            return Err(MonitorError::Config(
                "mempool_api_url is empty".to_string(),
            ));
        }

        Ok(self)
    }

    /// Alias for an address, if one is configured
    pub fn alias_of(&self, address: &str) -> Option<&str> {
        self.addresses
            .iter()
            .find(|entry| entry.address == address)
            .and_then(|entry| entry.alias.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(content: &str) -> Result<String> {
    use regex::Regex;

    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")?;
    let mut result = content.to_string();

    for cap in re.captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        if let Ok(var_value) = std::env::var(var_name) {
            result = result.replace(full_match, &var_value);
        } else {
            // Keep the placeholder if env var is not set
            tracing::warn!(
                "Environment variable {} not found, keeping placeholder",
                var_name
            );
        }
    }

    Ok(result)
}

/// Telegram notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

fn default_telegram_api_url() -> String {
    DEFAULT_TELEGRAM_API_URL.to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_url: default_telegram_api_url(),
        }
    }
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

/// Prometheus Pushgateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsPushConfig {
    /// Push gateway URL (e.g., "http://pushgateway:9091")
    pub push_url: String,
    #[serde(default = "default_job_name")]
    pub job_name: String,
    /// Optional username for Basic Auth
    #[serde(default)]
    pub auth_username: Option<String>,
    /// Password for Basic Auth (used only if username is set)
    #[serde(default)]
    pub auth_password: String,
}

fn default_job_name() -> String {
    "mempool_address_monitor".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_indexed_addresses() {
        let config = MonitorConfig::from_lookup(lookup_from(&[
            ("BITCOIN_ADDRESS_1", "bc1qone"),
            ("BITCOIN_ALIAS_1", "Savings"),
            ("BITCOIN_ADDRESS_2", "bc1qtwo"),
            ("BITCOIN_ADDRESS_4", "bc1qfour"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_USER_ID", "42"),
        ]));

        assert_eq!(
            config.addresses,
            vec![
                WatchedAddress::new("bc1qone", Some("Savings")),
                WatchedAddress::new("bc1qtwo", None),
            ]
        );
        assert_eq!(config.mempool_api_url, DEFAULT_MEMPOOL_API_URL);
        assert_eq!(config.state_file, PathBuf::from("mempool_transactions.json"));
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, "42");
        assert!(config.metrics.is_none());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = MonitorConfig::from_lookup(lookup_from(&[
            ("BITCOIN_ADDRESS_1", "bc1qone"),
            ("MEMPOOL_API_URL", "https://mempool.example/api"),
            ("TELEGRAM_CHAT_ID", "-100200"),
            ("TX_DATABASE_FILE", "/app/mempool_transactions.json"),
            ("METRICS_PUSH_URL", "http://pushgateway:9091"),
        ]));

        assert_eq!(config.mempool_api_url, "https://mempool.example/api");
        assert_eq!(config.telegram.chat_id, "-100200");
        assert_eq!(
            config.state_file,
            PathBuf::from("/app/mempool_transactions.json")
        );
        let metrics = config.metrics.unwrap();
        assert_eq!(metrics.push_url, "http://pushgateway:9091");
        assert_eq!(metrics.job_name, "mempool_address_monitor");
    }

    #[test]
    fn test_validate_rejects_empty_list() {
        let config = MonitorConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_address() {
        let mut config = MonitorConfig::from_lookup(lookup_from(&[("BITCOIN_ADDRESS_1", "a")]));
        config.addresses.push(WatchedAddress::new("   ", None));
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config = MonitorConfig::from_lookup(lookup_from(&[
            ("BITCOIN_ADDRESS_1", "bc1qsame"),
            ("BITCOIN_ADDRESS_2", " bc1qsame "),
        ]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bc1qsame"));
    }

    #[test]
    fn test_validate_normalises_entries() {
        let mut config = MonitorConfig::from_lookup(lookup_from(&[("BITCOIN_ADDRESS_1", "a")]));
        config.addresses = vec![
            WatchedAddress::new(" bc1qone ", Some("  ")),
            WatchedAddress::new("bc1qtwo", Some(" Hot ")),
        ];
        config.mempool_api_url = "https://mempool.space/api/".to_string();

        let config = config.validate().unwrap();
        assert_eq!(config.addresses[0], WatchedAddress::new("bc1qone", None));
        assert_eq!(config.alias_of("bc1qtwo"), Some("Hot"));
        assert_eq!(config.alias_of("bc1qone"), None);
        assert_eq!(config.addresses[0].display_name(), "bc1qone");
        assert_eq!(config.addresses[1].display_name(), "Hot");
        assert_eq!(config.mempool_api_url, "https://mempool.space/api");
    }

    #[test]
    #[serial]
    fn test_from_file_with_env_substitution() {
        std::env::set_var("TEST_MONITOR_BOT_TOKEN", "123456:ABC-DEF");

        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
addresses:
  - address: bc1qfirst
    alias: Treasury
  - address: bc1qsecond
telegram:
  bot_token: ${{TEST_MONITOR_BOT_TOKEN}}
  chat_id: "-100123456789"
state_file: /tmp/monitor-state.json
metrics:
  push_url: http://pushgateway:9091
"#
        )
        .unwrap();

        let config = MonitorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.addresses.len(), 2);
        assert_eq!(config.alias_of("bc1qfirst"), Some("Treasury"));
        assert_eq!(config.addresses[1].alias, None);
        assert_eq!(config.telegram.bot_token, "123456:ABC-DEF");
        assert_eq!(config.telegram.chat_id, "-100123456789");
        assert_eq!(config.telegram.api_url, DEFAULT_TELEGRAM_API_URL);
        assert_eq!(config.mempool_api_url, DEFAULT_MEMPOOL_API_URL);
        assert_eq!(config.request_timeout_seconds, 15);
        assert_eq!(config.state_file, PathBuf::from("/tmp/monitor-state.json"));
        assert_eq!(config.metrics.unwrap().job_name, "mempool_address_monitor");

        std::env::remove_var("TEST_MONITOR_BOT_TOKEN");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("BITCOIN_ADDRESS_1", "bc1qenv");
        std::env::set_var("BITCOIN_ALIAS_1", "From Env");
        std::env::remove_var("BITCOIN_ADDRESS_2");

        let config = MonitorConfig::from_env();
        assert_eq!(
            config.addresses,
            vec![WatchedAddress::new("bc1qenv", Some("From Env"))]
        );

        std::env::remove_var("BITCOIN_ADDRESS_1");
        std::env::remove_var("BITCOIN_ALIAS_1");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("MISSING_MONITOR_VAR");

        let input = "value: ${MISSING_MONITOR_VAR}";
        let result = substitute_env_vars(input).unwrap();

        // Should keep placeholder when var is missing
        assert_eq!(result, "value: ${MISSING_MONITOR_VAR}");
    }
}
