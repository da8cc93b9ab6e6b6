//! Configuration management for the Branch Inventory Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BIP__ prefix

use std::collections::HashMap;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::warehouse::{default_aliases, default_equivalents};
use shared::{WarehouseNameResolver, CENTRAL_WAREHOUSE};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Primary relational store
    pub database: DatabaseConfig,

    /// Secondary document store (mirrors and legacy vendors)
    pub document_store: DocumentStoreConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Warehouse alias table
    #[serde(default)]
    pub warehouses: WarehouseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentStoreConfig {
    /// Connection URL; may point at the primary database
    pub url: String,

    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying JWT tokens
    pub secret: String,
}

/// Extra warehouse spellings layered over the built-in table
#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    #[serde(default = "default_central_name")]
    pub central_name: String,

    /// alias -> canonical name
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    /// Additional same-city spelling sets
    #[serde(default)]
    pub equivalents: Vec<Vec<String>>,
}

fn default_central_name() -> String {
    CENTRAL_WAREHOUSE.to_string()
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            central_name: default_central_name(),
            aliases: HashMap::new(),
            equivalents: Vec::new(),
        }
    }
}

impl WarehouseConfig {
    /// Build the resolver: built-in aliases first, configured ones override
    pub fn build_resolver(&self) -> WarehouseNameResolver {
        let aliases = default_aliases()
            .into_iter()
            .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
            .chain(self.aliases.clone());
        let equivalents = default_equivalents()
            .into_iter()
            .map(|set| set.into_iter().map(str::to_string).collect::<Vec<_>>())
            .chain(self.equivalents.clone());
        WarehouseNameResolver::new(&self.central_name, aliases, equivalents)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("BIP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("document_store.max_connections", 5)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BIP__ prefix)
            .add_source(
                Environment::with_prefix("BIP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
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
