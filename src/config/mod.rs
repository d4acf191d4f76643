use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Location;
use crate::services::id_gen;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub search: SearchConfig,
    pub orders: OrdersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_database_name")]
    pub database_name: String,
}

/// Search defaults: page size plus the origin used when a caller does
/// not supply one.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_count")]
    pub default_count: usize,
    #[serde(default = "default_origin_lat")]
    pub origin_lat: f64,
    #[serde(default = "default_origin_lng")]
    pub origin_lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    #[serde(default = "default_id_suffix_len")]
    pub id_suffix_len: usize,
}

impl Config {
    /// Load configuration from `CHOW_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let database = DatabaseConfig::from_env()?;
        let search = SearchConfig::from_env()?;
        let orders = OrdersConfig::from_env()?;

        let config = Config {
            database,
            search,
            orders,
        };
        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Database URL cannot be empty".to_string(),
            });
        }

        if !self.database.url.starts_with("mongodb://")
            && !self.database.url.starts_with("mongodb+srv://")
        {
            return Err(ConfigError::ValidationError {
                message: format!("Database URL scheme not recognized: {}", self.database.url),
            });
        }

        if self.database.database_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Database name cannot be empty".to_string(),
            });
        }

        if self.search.default_count == 0 {
            return Err(ConfigError::ValidationError {
                message: "Default page size cannot be 0".to_string(),
            });
        }

        if self.orders.id_suffix_len == 0 {
            return Err(ConfigError::ValidationError {
                message: "Order id suffix width cannot be 0".to_string(),
            });
        }

        if self.orders.id_suffix_len < 6 {
            warn!(
                "Order id suffix width {} is a test-only setting; ids will be guessable",
                self.orders.id_suffix_len
            );
        }

        Ok(())
    }

    /// The origin used by `locate` when the caller supplies none.
    pub fn default_origin(&self) -> Location {
        Location::new(self.search.origin_lat, self.search.origin_lng)
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("CHOW"))
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load database config: {}", e),
            })?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to deserialize database config: {}", e),
            })
    }
}

impl SearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("CHOW"))
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load search config: {}", e),
            })?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to deserialize search config: {}", e),
            })
    }
}

impl OrdersConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("CHOW"))
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load orders config: {}", e),
            })?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to deserialize orders config: {}", e),
            })
    }
}

pub(crate) fn default_url() -> String {
    "mongodb://localhost:27017".to_string()
}

pub(crate) fn default_database_name() -> String {
    "chow".to_string()
}

pub(crate) fn default_count() -> usize {
    5
}

// Downtown Binghamton, the service's home market.
pub(crate) fn default_origin_lat() -> f64 {
    42.0987
}

pub(crate) fn default_origin_lng() -> f64 {
    -75.9180
}

pub(crate) fn default_id_suffix_len() -> usize {
    id_gen::DEFAULT_SUFFIX_LEN
}
