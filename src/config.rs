//! Settings from `.spendlens.toml`.
//!
//! Every section is optional; missing keys fall back to the defaults below
//! and explicit command-line flags win over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".spendlens.toml";

/// Everything read from `.spendlens.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Invoice data settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Settings not tied to one command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log at debug level unless `--quiet` is given.
    #[serde(default)]
    pub verbose: bool,
}

/// Where invoices come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON file holding the invoice collection.
    #[serde(default = "default_invoices_path")]
    pub invoices_path: PathBuf,

    /// Number of invoices in a generated mock dataset.
    #[serde(default = "default_mock_count")]
    pub mock_count: usize,

    /// Seed for the mock dataset, for reproducible demos.
    #[serde(default)]
    pub mock_seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            invoices_path: default_invoices_path(),
            mock_count: default_mock_count(),
            mock_seed: None,
        }
    }
}

fn default_invoices_path() -> PathBuf {
    PathBuf::from("invoices.json")
}

fn default_mock_count() -> usize {
    200
}

/// The language model behind `ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Sampling temperature. 0.0 keeps generated SQL deterministic.
    #[serde(default)]
    pub temperature: f32,

    /// Seconds to wait for one model answer.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum rows returned for a generated query.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: 0.0,
            timeout_seconds: default_timeout(),
            max_rows: default_max_rows(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_max_rows() -> usize {
    100
}

/// Dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows per page in the invoice table.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    10
}

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the account files.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".spendlens")
}

impl Config {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Look for `.spendlens.toml` in the working directory.
    ///
    /// A missing file is `Ok(None)`; a file that fails to parse is an error.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Apply command-line overrides.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.invoices {
            self.data.invoices_path = path.clone();
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(ref dir) = args.state_dir {
            self.session.state_dir = dir.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The defaults as TOML, written by `init-config`.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.temperature, 0.0);
        assert_eq!(config.data.mock_count, 200);
        assert_eq!(config.dashboard.page_size, 10);
        assert_eq!(config.data.invoices_path, PathBuf::from("invoices.json"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[data]
invoices_path = "data/q1.json"
mock_seed = 42

[model]
name = "qwen2.5:7b"
max_rows = 25

[dashboard]
page_size = 20
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.invoices_path, PathBuf::from("data/q1.json"));
        assert_eq!(config.data.mock_seed, Some(42));
        assert_eq!(config.data.mock_count, 200);
        assert_eq!(config.model.name, "qwen2.5:7b");
        assert_eq!(config.model.max_rows, 25);
        assert_eq!(config.model.ollama_url, "http://localhost:11434");
        assert_eq!(config.dashboard.page_size, 20);
        assert_eq!(config.session.state_dir, PathBuf::from(".spendlens"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[dashboard]"));
        assert!(toml_str.contains("[session]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.model.max_rows, 100);
    }
}
