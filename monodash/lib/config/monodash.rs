//! The monodash configuration file.
//!
//! Every section and field is optional, a missing value takes its default:
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 2022
//! database:
//!   path: /var/lib/monodash/monodash.db
//!   max_connections: 5
//! telemetry:
//!   source: simulated   # or `system`
//!   hostname: pve-01
//!   total_memory: 65536
//!   seed: 42
//! lifecycle:
//!   strict_transitions: false
//! log:
//!   level: info
//!   dir: /var/log/monodash
//! ```

use std::path::{Path, PathBuf};

use getset::{Getters, Setters};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    lifecycle::TransitionPolicy, management::DEFAULT_MAX_CONNECTIONS, utils, MonodashError,
    MonodashResult,
};

use super::{DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SIMULATED_TOTAL_MEMORY};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The monodash configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder, Getters, Setters)]
#[getset(get = "pub with_prefix", set = "pub with_prefix")]
#[serde(default)]
pub struct MonodashConfig {
    /// HTTP server settings.
    #[builder(default)]
    pub(super) server: ServerConfig,

    /// Storage settings.
    #[builder(default)]
    pub(super) database: DatabaseConfig,

    /// Where host telemetry comes from.
    #[builder(default)]
    pub(super) telemetry: TelemetryConfig,

    /// Lifecycle engine settings.
    #[builder(default)]
    pub(super) lifecycle: LifecycleConfig,

    /// Logging settings.
    #[builder(default)]
    pub(super) log: LogConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder, Getters, Setters)]
#[getset(get = "pub with_prefix", set = "pub with_prefix")]
#[serde(default)]
pub struct ServerConfig {
    /// The address to bind to.
    #[builder(default = DEFAULT_SERVER_HOST.to_string(), setter(into))]
    pub(super) host: String,

    /// The port to listen on.
    #[builder(default = DEFAULT_SERVER_PORT)]
    pub(super) port: u16,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder, Getters, Setters)]
#[getset(get = "pub with_prefix", set = "pub with_prefix")]
#[serde(default)]
pub struct DatabaseConfig {
    /// The SQLite database file. Defaults to `monodash.db` in the monodash home directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    pub(super) path: Option<PathBuf>,

    /// Upper bound of the connection pool.
    #[builder(default = DEFAULT_MAX_CONNECTIONS)]
    pub(super) max_connections: u32,
}

/// The kind of telemetry source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetrySourceKind {
    /// Random values.
    #[default]
    Simulated,

    /// The machine monodash runs on.
    System,
}

/// Telemetry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder, Getters, Setters)]
#[getset(get = "pub with_prefix", set = "pub with_prefix")]
#[serde(default)]
pub struct TelemetryConfig {
    /// Which source produces host snapshots.
    #[builder(default)]
    pub(super) source: TelemetrySourceKind,

    /// Hostname to report instead of the source's own.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    pub(super) hostname: Option<String>,

    /// Total memory in MB of the simulated host.
    #[builder(default = DEFAULT_SIMULATED_TOTAL_MEMORY)]
    pub(super) total_memory: i64,

    /// Seed of the simulated source.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub(super) seed: Option<u64>,
}

/// Lifecycle engine settings.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, TypedBuilder, Getters, Setters,
)]
#[getset(get = "pub with_prefix", set = "pub with_prefix")]
#[serde(default)]
pub struct LifecycleConfig {
    /// Reject actions that do not apply to an instance's status instead of ignoring them.
    #[builder(default)]
    pub(super) strict_transitions: bool,
}

/// Logging settings.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, TypedBuilder, Getters, Setters,
)]
#[getset(get = "pub with_prefix", set = "pub with_prefix")]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or `monodash=debug`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    pub(super) level: Option<String>,

    /// Directory for daily rolling log files. Logs only go to stderr when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    pub(super) dir: Option<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MonodashConfig {
    /// Loads the configuration.
    ///
    /// The file is looked up as described in [`utils::resolve_config_path`]. A missing default
    /// file yields the default configuration, a missing file that was asked for is an error.
    pub async fn load(explicit: Option<&Path>) -> MonodashResult<Self> {
        let (path, explicit) = utils::resolve_config_path(explicit);

        if !tokio::fs::try_exists(&path).await? {
            if explicit {
                return Err(MonodashError::InvalidConfig(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }

            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let config = Self::from_yaml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config");

        Ok(config)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> MonodashResult<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but make no sense.
    pub fn validate(&self) -> MonodashResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(MonodashError::InvalidConfig(
                "server.host must not be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(MonodashError::InvalidConfig(
                "server.port must not be 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(MonodashError::InvalidConfig(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if self.telemetry.total_memory <= 0 {
            return Err(MonodashError::InvalidConfig(format!(
                "telemetry.total_memory must be positive, got {}",
                self.telemetry.total_memory
            )));
        }

        if matches!(&self.telemetry.hostname, Some(h) if h.trim().is_empty()) {
            return Err(MonodashError::InvalidConfig(
                "telemetry.hostname must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the database file to open.
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| utils::default_db_path(&utils::get_monodash_home_path()))
    }

    /// Returns the directory for log files, if file logging is enabled.
    ///
    /// A relative directory is taken relative to the monodash home directory.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log.dir.as_ref().map(|dir| {
            if dir.is_relative() {
                utils::get_monodash_home_path().join(dir)
            } else {
                dir.clone()
            }
        })
    }
}

impl LifecycleConfig {
    /// Returns the transition policy the engine should use.
    pub fn policy(&self) -> TransitionPolicy {
        if self.strict_transitions {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Lenient
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for MonodashConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
