//! Engine and analysis settings.
//!
//! These types deserialize from the `[engine]` table and the top-level
//! `depth` key of a review configuration file. Every field has a default.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bootstrap::{EngineProvider, ProcessProvider, RetryPolicy};
use crate::engine::EngineOptions;

/// Default search depth for every analyzed position.
pub const DEFAULT_DEPTH: u32 = 13;

/// One place to look for an engine executable.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineSource {
    /// Label for logs. Defaults to the command.
    #[serde(default)]
    pub name: Option<String>,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineSource {
    pub fn command(command: &str) -> Self {
        Self {
            name: None,
            command: command.to_string(),
            args: Vec::new(),
        }
    }

    fn provider(&self) -> ProcessProvider {
        let provider = ProcessProvider::new(self.command.clone()).with_args(self.args.clone());
        match &self.name {
            Some(name) => provider.with_name(name.clone()),
            None => provider,
        }
    }
}

/// Engine connection settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Tried in order. Defaults to the usual Stockfish install locations.
    #[serde(default = "default_sources")]
    pub sources: Vec<EngineSource>,
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Time limit for finding any working engine.
    #[serde(default = "default_bootstrap_timeout_ms")]
    pub bootstrap_timeout_ms: u64,
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
    #[serde(default = "default_attempts_per_source")]
    pub attempts_per_source: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// UCI options sent during the handshake.
    #[serde(default = "default_options")]
    pub options: BTreeMap<String, String>,
}

fn default_sources() -> Vec<EngineSource> {
    [
        "stockfish",
        "/usr/games/stockfish",
        "/usr/local/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
    ]
    .into_iter()
    .map(EngineSource::command)
    .collect()
}

fn default_handshake_timeout_ms() -> u64 {
    8_000
}

fn default_bootstrap_timeout_ms() -> u64 {
    25_000
}

fn default_search_timeout_ms() -> u64 {
    60_000
}

fn default_stop_grace_ms() -> u64 {
    2_000
}

fn default_attempts_per_source() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_options() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Hash".to_string(), "32".to_string()),
        ("Threads".to_string(), "1".to_string()),
    ])
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            bootstrap_timeout_ms: default_bootstrap_timeout_ms(),
            search_timeout_ms: default_search_timeout_ms(),
            stop_grace_ms: default_stop_grace_ms(),
            attempts_per_source: default_attempts_per_source(),
            retry_backoff_ms: default_retry_backoff_ms(),
            options: default_options(),
        }
    }
}

impl EngineConfig {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            search_timeout: Duration::from_millis(self.search_timeout_ms),
            stop_grace: Duration::from_millis(self.stop_grace_ms),
            uci_options: self
                .options
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts_per_source: self.attempts_per_source,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }

    /// One process provider per configured source, in order.
    pub fn providers(&self) -> Vec<Box<dyn EngineProvider>> {
        self.sources
            .iter()
            .map(|s| Box::new(s.provider()) as Box<dyn EngineProvider>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sources.len(), 4);
        assert_eq!(config.sources[0].command, "stockfish");

        let options = config.engine_options();
        assert_eq!(options.search_timeout, Duration::from_secs(60));
        assert!(options
            .uci_options
            .contains(&("Hash".to_string(), "32".to_string())));
        assert_eq!(config.retry_policy().attempts_per_source, 1);
        assert_eq!(config.bootstrap_timeout(), Duration::from_secs(25));
    }

    #[test]
    fn parse_partial_toml() {
        let toml_content = r#"
search_timeout_ms = 5000
attempts_per_source = 3

[options]
Hash = "64"

[[sources]]
name = "local"
command = "/opt/sf/stockfish"
args = ["--quiet"]
"#;
        let config: EngineConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.search_timeout_ms, 5_000);
        assert_eq!(config.attempts_per_source, 3);
        assert_eq!(config.handshake_timeout_ms, 8_000);
        assert_eq!(config.options.get("Hash").map(String::as_str), Some("64"));
        assert!(!config.options.contains_key("Threads"));

        assert_eq!(config.sources.len(), 1);
        let providers = config.providers();
        assert_eq!(providers[0].name(), "local");
    }

    #[test]
    fn empty_toml_is_default() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
