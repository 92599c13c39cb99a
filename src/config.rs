// src/config.rs

use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::logging::project_directory;

/// Runtime settings shared by the CLI and the API server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    /// Upper bound for every network call, in seconds.
    pub timeout_secs: u64,
    /// User-Agent sent with page fetches.
    pub user_agent: String,
    /// How many times a DNS query is attempted before giving up.
    pub dns_attempts: usize,
    /// Route HTTP probes through the proxy named by the environment.
    pub use_system_proxy: bool,
    pub api_host: String,
    pub api_port: u16,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (FangScan)".to_string(),
            dns_attempts: 2,
            use_system_proxy: true,
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
        }
    }
}

impl ScanConfig {
    /// Loads the config file (if any), then applies environment overrides.
    ///
    /// The file is `$FANGSCAN_CONFIG`, or `config.json` in the platform config
    /// directory. A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self> {
        let path = env::var("FANGSCAN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());

        let file_cfg: Option<ScanConfig> = fs::read_to_string(&path)
            .ok()
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .wrap_err_with(|| format!("failed to parse {}", path.display()))?;

        let mut cfg = file_cfg.unwrap_or_default();
        cfg.apply_env(|key| env::var(key).ok());
        Ok(cfg)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("FANGSCAN_TIMEOUT") {
            self.timeout_secs = v.parse().unwrap_or(self.timeout_secs);
        }
        if let Some(v) = var("FANGSCAN_HOST") {
            self.api_host = v;
        }
        if let Some(v) = var("PORT") {
            self.api_port = v.parse().unwrap_or(self.api_port);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_config_path() -> PathBuf {
    project_directory()
        .map(|dirs| dirs.config_dir().join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_bound_network_calls_to_ten_seconds() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.api_port, 8000);
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("FANGSCAN_TIMEOUT", "3"), ("PORT", "9090"), ("FANGSCAN_HOST", "127.0.0.1")]);
        let mut cfg = ScanConfig::default();
        cfg.apply_env(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.timeout_secs, 3);
        assert_eq!(cfg.api_port, 9090);
        assert_eq!(cfg.api_host, "127.0.0.1");
    }

    #[test]
    fn unparsable_env_values_are_ignored() {
        let mut cfg = ScanConfig::default();
        cfg.apply_env(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(cfg.api_port, 8000);
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let cfg: ScanConfig = serde_json::from_str(r#"{"timeout_secs": 4}"#).unwrap();
        assert_eq!(cfg.timeout_secs, 4);
        assert_eq!(cfg.dns_attempts, 2);
    }
}
