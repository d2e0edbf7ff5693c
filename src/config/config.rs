// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use crate::logging::LogFormat;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "DATASTORE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listen address (e.g., "127.0.0.1:8080")
    #[serde(alias = "ListenAddress")]
    pub listen_address: SocketAddr,

    /// SQLite connection string (e.g., "sqlite:data.db")
    #[serde(alias = "DSN")]
    pub dsn: String,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Silence sqlx statement logging
    #[serde(default)]
    pub quiet_store: bool,

    /// Age after which key-value entries are purged; unset keeps them forever
    #[serde(default)]
    pub retention_secs: Option<u64>,

    #[serde(default = "default_retention_interval_secs")]
    pub retention_interval_secs: u64,

    #[serde(default)]
    pub nft: NftConfig,
}

/// Upstream NFT minting API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NftConfig {
    pub base_url: String,
    pub project_uid: String,
    pub api_key: Option<String>,
    /// Wallet receiving minted tokens
    pub receiver_address: String,
    pub token_count: String,
    pub upload_source: String,
}

impl Default for NftConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://studio-api.nmkr.io"),
            project_uid: String::new(),
            api_key: None,
            receiver_address: String::new(),
            token_count: String::from("1"),
            upload_source: String::from("api"),
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_retention_interval_secs() -> u64 {
    3600
}

impl Config {
    /// Load configuration from the file named by `DATASTORE_CONFIG`, then
    /// apply environment variable overrides. Any failure is fatal to startup.
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = Self::load_from(Path::new(&config_path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file; `.toml` files as TOML, everything else as JSON.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;

        let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            toml::from_str(&contents)
                .with_context(|| format!("could not parse TOML config {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("could not parse JSON config {}", path.display()))?
        };

        Ok(config)
    }

    /// Apply `DATASTORE_*` overrides resolved through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("DATASTORE_LISTEN_ADDRESS") {
            self.listen_address = SocketAddr::from_str(&val)
                .with_context(|| format!("invalid DATASTORE_LISTEN_ADDRESS {val:?}"))?;
        }
        if let Some(val) = lookup("DATASTORE_DSN") {
            self.dsn = val;
        }
        if let Some(val) = lookup("DATASTORE_LOG_LEVEL") {
            self.log_level = val;
        }
        if let Some(val) = lookup("DATASTORE_NFT_API_KEY") {
            self.nft.api_key = Some(val);
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dsn.trim().is_empty() {
            anyhow::bail!("dsn must not be empty");
        }
        url::Url::parse(&self.nft.base_url)
            .with_context(|| format!("invalid nft.base_url {:?}", self.nft.base_url))?;
        Ok(())
    }

    /// JSON rendering with secrets masked, safe for logs.
    pub fn obfuscated(&self) -> anyhow::Result<String> {
        let mut masked = self.clone();
        if masked.nft.api_key.is_some() {
            masked.nft.api_key = Some("xxx".to_string());
        }
        Ok(serde_json::to_string_pretty(&masked)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_config;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::Builder;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let file = Builder::new().suffix(suffix).tempfile().unwrap();
        fs::write(file.path(), contents).unwrap();
        file
    }

    #[test]
    fn test_load_from_json_with_defaults() {
        let file = write_config(
            ".json",
            r#"{"listen_address": "0.0.0.0:9000", "dsn": "sqlite:data.db"}"#,
        );

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.listen_address, SocketAddr::from_str("0.0.0.0:9000").unwrap());
        assert_eq!(config.dsn, "sqlite:data.db");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.quiet_store);
        assert_eq!(config.retention_secs, None);
        assert_eq!(config.retention_interval_secs, 3600);
        assert_eq!(config.nft.token_count, "1");
    }

    #[test]
    fn test_load_from_json_accepts_legacy_field_names() {
        let file = write_config(
            ".json",
            r#"{"ListenAddress": "127.0.0.1:8080", "DSN": "sqlite::memory:"}"#,
        );

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.listen_address.port(), 8080);
        assert_eq!(config.dsn, "sqlite::memory:");
    }

    #[test]
    fn test_load_from_toml() {
        let file = write_config(
            ".toml",
            r#"
listen_address = "127.0.0.1:7000"
dsn = "sqlite:/var/lib/datastore/data.db"
log_level = "debug"
log_format = "json"
retention_secs = 86400

[nft]
project_uid = "project-123"
api_key = "secret"
receiver_address = "addr1xyz"
"#,
        );

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.listen_address.port(), 7000);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.retention_secs, Some(86400));
        assert_eq!(config.nft.project_uid, "project-123");
        assert_eq!(config.nft.api_key.as_deref(), Some("secret"));
        assert_eq!(config.nft.base_url, "https://studio-api.nmkr.io");
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let err = Config::load_from(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("could not read config file"));
    }

    #[test]
    fn test_load_from_malformed_file_fails() {
        let file = write_config(".json", "{ not json");
        assert!(Config::load_from(file.path()).is_err());

        let file = write_config(".json", r#"{"dsn": "sqlite::memory:"}"#);
        assert!(Config::load_from(file.path()).is_err(), "listen_address is required");
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = create_test_config();
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATASTORE_LISTEN_ADDRESS", "192.168.1.1:9090"),
            ("DATASTORE_DSN", "sqlite:/tmp/override.db"),
            ("DATASTORE_LOG_LEVEL", "trace"),
            ("DATASTORE_NFT_API_KEY", "env-key-456"),
        ]);

        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.listen_address, SocketAddr::from_str("192.168.1.1:9090").unwrap());
        assert_eq!(config.dsn, "sqlite:/tmp/override.db");
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.nft.api_key.as_deref(), Some("env-key-456"));
    }

    #[test]
    fn test_override_with_bad_address_fails() {
        let mut config = create_test_config();
        let result = config.apply_overrides(|key| {
            (key == "DATASTORE_LISTEN_ADDRESS").then(|| "not-an-address".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = create_test_config();
        assert!(config.validate().is_ok());

        config.nft.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = create_test_config();
        config.dsn = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_obfuscated_masks_api_key() {
        let mut config = create_test_config();
        config.nft.api_key = Some("59b826e660db4fbf".to_string());

        let rendered = config.obfuscated().unwrap();
        assert!(!rendered.contains("59b826e660db4fbf"));
        assert!(rendered.contains("\"api_key\": \"xxx\""));
        assert!(rendered.contains("sqlite::memory:"));
    }
}
