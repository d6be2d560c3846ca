use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_refresh_interval_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinHolding {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CryptoCompareConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub cryptocompare: Option<CryptoCompareConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            cryptocompare: Some(CryptoCompareConfig {
                base_url: "https://min-api.cryptocompare.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub currency: String,
    /// Seconds between portfolio refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    pub coins: Vec<CoinHolding>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "coinfolio", "coinfolio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Configured symbols, in declaration order.
    pub fn symbols(&self) -> Vec<String> {
        self.coins.iter().map(|c| c.name.clone()).collect()
    }

    /// Held amount for a symbol as the upstream reports it (exact case).
    /// Unknown symbols hold nothing.
    pub fn amount_for(&self, symbol: &str) -> f64 {
        self.coins
            .iter()
            .find(|c| c.name == symbol)
            .map_or(0.0, |c| c.amount)
    }
}
