use std::path::{Path, PathBuf};

use anyhow::Context;
use prov_sdk::HttpStoreConfig;
use prov_server::ServerConfig;
use prov_store::ClientConfig;
use prov_tag::TagConfig;
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "prov.toml";

/// Which tag reader the CLI drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    /// No reader; tag steps are simulated.
    #[default]
    None,
    /// Keyboard-wedge optical scanner typing into stdin.
    Stdin,
}

/// Everything the `prov` binary can be configured with.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvConfig {
    pub scanner: ScannerKind,
    /// Remote server; when absent an in-process store is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<HttpStoreConfig>,
    pub tag: TagConfig,
    pub store: ClientConfig,
    pub server: ServerConfig,
}

impl ProvConfig {
    /// Load `path`, or `./prov.toml` if it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(&fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("cannot render configuration")
    }

    /// Apply command-line overrides on top of the file.
    pub fn with_overrides(mut self, server: Option<&str>, scanner: Option<ScannerKind>) -> Self {
        if let Some(url) = server {
            let remote = self.remote.get_or_insert_with(HttpStoreConfig::default);
            remote.base_url = url.to_string();
        }
        if let Some(scanner) = scanner {
            self.scanner = scanner;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults_are_local_and_simulated() {
        let config = ProvConfig::default();
        assert_eq!(config.scanner, ScannerKind::None);
        assert!(config.remote.is_none());
        assert!(config.tag.allow_simulation);
        assert_eq!(config.server.bind_addr.port(), 5000);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
scanner = "stdin"

[remote]
base_url = "http://prov.internal:8080"

[tag]
discover_timeout = {{ secs = 12, nanos = 0 }}
allow_simulation = false
"#
        )
        .unwrap();

        let config = ProvConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.scanner, ScannerKind::Stdin);
        let remote = config.remote.unwrap();
        assert_eq!(remote.base_url, "http://prov.internal:8080");
        assert_eq!(remote.request_timeout, Duration::from_secs(10));
        assert_eq!(config.tag.discover_timeout, Duration::from_secs(12));
        assert_eq!(config.tag.transaction_timeout, Duration::from_secs(5));
        assert!(!config.tag.allow_simulation);
        assert_eq!(config.store.call_timeout, Duration::from_secs(10));
    }

    #[test]
    fn rendered_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prov.toml");
        std::fs::write(&path, ProvConfig::default().to_toml().unwrap()).unwrap();

        let loaded = ProvConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.scanner, ScannerKind::None);
        assert_eq!(loaded.tag.simulation_seed, TagConfig::default().simulation_seed);
        assert_eq!(loaded.server.max_body_bytes, 64 * 1024);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProvConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scanner = \"laser\"").unwrap();
        assert!(ProvConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn flags_override_file() {
        let config = ProvConfig::default()
            .with_overrides(Some("http://10.0.0.5:5000"), Some(ScannerKind::Stdin));
        assert_eq!(config.scanner, ScannerKind::Stdin);
        assert_eq!(config.remote.unwrap().base_url, "http://10.0.0.5:5000");
    }
}
