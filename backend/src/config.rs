//! Configuration management for the Blood Bank Inventory server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BBI__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::ledger::metrics::DEFAULT_STORAGE_CAPACITY;
use shared::models::{AlertSettings, DEFAULT_LOW_STOCK_THRESHOLD};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Where ledger records are kept
    pub storage: StorageConfig,

    /// Ledger and alert tuning
    pub inventory: InventoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one JSON file per ledger record
    pub data_dir: String,

    /// Seed the demo inventory when the data directory holds no stock
    pub seed_demo_data: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Threshold used until one has been saved
    pub default_threshold: u32,

    /// Storage capacity in units, for utilisation reports
    pub storage_capacity: u32,

    /// Raise a low-stock alert when a stocked type reaches zero
    pub alert_when_exhausted: bool,
}

impl InventoryConfig {
    pub fn alert_settings(&self) -> AlertSettings {
        AlertSettings {
            low_stock_threshold: self.default_threshold,
            alert_when_exhausted: self.alert_when_exhausted,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("BBI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.data_dir", "data")?
            .set_default("storage.seed_demo_data", false)?
            .set_default("inventory.default_threshold", DEFAULT_LOW_STOCK_THRESHOLD)?
            .set_default("inventory.storage_capacity", DEFAULT_STORAGE_CAPACITY)?
            .set_default("inventory.alert_when_exhausted", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BBI__ prefix)
            .add_source(
                Environment::with_prefix("BBI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig {
                data_dir: "data".to_string(),
                seed_demo_data: false,
            },
            inventory: InventoryConfig {
                default_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
                storage_capacity: DEFAULT_STORAGE_CAPACITY,
                alert_when_exhausted: false,
            },
        }
    }
}
