//! Application configuration management.

use serde::Deserialize;

/// Core configuration for the ledger engine.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// Ledger configuration.
    pub ledger: LedgerConfig,
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// ISO 4217 code of the functional (base) currency.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Fractional digits used when a currency does not specify its own.
    #[serde(default = "default_scale")]
    pub default_scale: u32,
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_scale() -> u32 {
    2
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            default_scale: default_scale(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KEYSTONE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
