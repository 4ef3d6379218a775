//! Configuration for the surety daemon

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use surety_ledger::{Address, LedgerConfig};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Ledger economics and consensus parameters
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Owner and genesis airline
    #[serde(default)]
    pub genesis: GenesisConfig,

    /// Simulated oracle network
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Notifications kept for the event listing
    #[serde(default = "default_event_history")]
    pub event_history: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            enable_cors: true,
            event_history: default_event_history(),
        }
    }
}

/// Ledger owner and the airline seeded at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default = "default_owner")]
    pub owner: Address,

    #[serde(default = "default_genesis_airline")]
    pub airline: Address,

    #[serde(default = "default_genesis_name")]
    pub name: String,

    /// Escrow the genesis airline's minimum funds at startup
    #[serde(default = "default_true")]
    pub funded: bool,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            airline: default_genesis_airline(),
            name: default_genesis_name(),
            funded: true,
        }
    }
}

/// Simulated oracle network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Run the simulated oracles
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Number of oracles registered at startup
    #[serde(default = "default_oracle_count")]
    pub oracle_count: usize,

    /// Seed for index selection and random statuses; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,

    /// Status code every oracle reports until changed through the API
    #[serde(default)]
    pub status_override: Option<u8>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            oracle_count: default_oracle_count(),
            seed: None,
            status_override: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_event_history() -> usize {
    256
}

fn default_owner() -> Address {
    Address::new("0x627306090abab3a6e1400e9345bc60c78a8bef57")
}

fn default_genesis_airline() -> Address {
    Address::new("0xf17f52151ebef6c7334fad080c5704d77216b732")
}

fn default_genesis_name() -> String {
    "Genesis Airline".to_string()
}

fn default_oracle_count() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file, then the environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables, e.g. SURETY_SIMULATOR__ORACLE_COUNT=30
        builder = builder.add_source(
            config::Environment::with_prefix("SURETY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
