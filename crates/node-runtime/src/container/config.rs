//! # Node Configuration
//!
//! Unified configuration for the contract, the identity directory, the
//! ledger backend, the event bus and logging.
//!
//! Every section has a working default. `FT_*` environment variables
//! override selected values; [`NodeConfig::validate`] rejects combinations
//! the contract cannot run with.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FT_RICH_QUERIES` | `ledger.rich_queries_enabled` |
//! | `FT_BUS_CAPACITY` | `event_bus.capacity` |
//! | `FT_LOG_FILTER` | `logging.filter` |
//! | `FT_MAX_PAGE_SIZE` | `contract.max_page_size` |
//! | `FT_RECALL_WINDOW_HOURS` | `contract.default_recall_window_hours` |

use std::str::FromStr;

use ft_01_identity::IdentityConfig;
use ft_02_shipments::ContractConfig;
use thiserror::Error;
use tracing::info;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Contract limits.
    pub contract: ContractConfig,
    /// Identity directory settings.
    pub identity: IdentityConfig,
    /// Ledger backend settings.
    pub ledger: LedgerConfig,
    /// Event bus settings.
    pub event_bus: EventBusConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment override could not be parsed.
    #[error("{var}: cannot parse '{value}'")]
    InvalidValue { var: String, value: String },

    /// A limit that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// Default page size above the maximum page size.
    #[error("default page size {default} exceeds maximum {max}")]
    PageSizeOrder { default: u32, max: u32 },

    /// Default recall window outside `1..=max`.
    #[error("default recall window {default}h must be within 1..={max}h")]
    RecallWindow { default: i64, max: i64 },

    /// No full-id prefix configured.
    #[error("at least one full-id prefix is required")]
    NoFullIdPrefix,

    /// Blank log filter.
    #[error("log filter cannot be empty")]
    EmptyLogFilter,
}

/// Ledger backend configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Serve attribute queries; when off, listings fall back to scans.
    pub rich_queries_enabled: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rich_queries_enabled: true,
        }
    }
}

/// Event bus configuration.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Events buffered per subscriber before lagging subscribers skip.
    pub capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

fn parse<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}

impl NodeConfig {
    /// Defaults with `FT_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults with overrides taken from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("FT_RICH_QUERIES") {
            config.ledger.rich_queries_enabled = parse_bool("FT_RICH_QUERIES", &v)?;
        }
        if let Some(v) = lookup("FT_BUS_CAPACITY") {
            config.event_bus.capacity = parse("FT_BUS_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("FT_LOG_FILTER") {
            config.logging.filter = v;
        }
        if let Some(v) = lookup("FT_MAX_PAGE_SIZE") {
            config.contract.max_page_size = parse("FT_MAX_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("FT_RECALL_WINDOW_HOURS") {
            config.contract.default_recall_window_hours = parse("FT_RECALL_WINDOW_HOURS", &v)?;
        }
        Ok(config)
    }

    /// Reject values the contract cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.contract;
        if c.max_page_size == 0 {
            return Err(ConfigError::Zero("max page size"));
        }
        if c.default_page_size == 0 {
            return Err(ConfigError::Zero("default page size"));
        }
        if c.default_page_size > c.max_page_size {
            return Err(ConfigError::PageSizeOrder {
                default: c.default_page_size,
                max: c.max_page_size,
            });
        }
        if c.default_recall_window_hours < 1
            || c.default_recall_window_hours > c.max_recall_window_hours
        {
            return Err(ConfigError::RecallWindow {
                default: c.default_recall_window_hours,
                max: c.max_recall_window_hours,
            });
        }
        if c.max_string_length == 0 {
            return Err(ConfigError::Zero("max string length"));
        }
        if c.max_array_elements == 0 {
            return Err(ConfigError::Zero("max array elements"));
        }
        if c.actionable_scan_multiplier == 0 {
            return Err(ConfigError::Zero("actionable scan multiplier"));
        }
        if self.identity.full_id_prefixes.is_empty() {
            return Err(ConfigError::NoFullIdPrefix);
        }
        if self.event_bus.capacity == 0 {
            return Err(ConfigError::Zero("event bus capacity"));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::EmptyLogFilter);
        }
        Ok(())
    }

    /// Log the effective configuration.
    pub fn log_summary(&self) {
        info!(
            rich_queries = self.ledger.rich_queries_enabled,
            bus_capacity = self.event_bus.capacity,
            max_page_size = self.contract.max_page_size,
            recall_window_hours = self.contract.default_recall_window_hours,
            "Node configuration loaded"
        );
    }
}
