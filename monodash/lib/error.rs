use std::{
    error::Error,
    fmt::{self, Display},
};
use thiserror::Error;

use crate::models::{InstanceStatus, LifecycleAction};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a monodash-related operation.
pub type MonodashResult<T> = Result<T, MonodashError>;

/// An error that occurred while serving a dashboard or lifecycle operation.
#[derive(Debug, Error)]
pub enum MonodashError {
    /// The referenced instance or record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// No host telemetry snapshot has been recorded yet.
    #[error("no host telemetry available")]
    NoTelemetryAvailable,

    /// Metrics were requested for an instance that is not running.
    #[error("cannot record metrics for instance {handle}: instance is not running (status: {status})")]
    NotRunning {
        /// The handle of the instance.
        handle: i64,

        /// The status the instance is currently in.
        status: InstanceStatus,
    },

    /// The input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A unique column already holds the given value.
    #[error("uniqueness violation: {0}")]
    UniquenessViolation(String),

    /// The action is not defined for the instance's current status.
    #[error("cannot {action} instance {handle} while it is {status}")]
    InvalidTransition {
        /// The handle of the instance.
        handle: i64,

        /// The status the instance is currently in.
        status: InstanceStatus,

        /// The rejected action.
        action: LifecycleAction,
    },

    /// The instance was modified by another writer between read and write.
    #[error("instance {0} was modified concurrently")]
    ConcurrentModification(i64),

    /// A stored row violates the instance invariants.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// An error returned by the database.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error that occurred while applying migrations.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// The configuration is invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MonodashError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> MonodashError {
        MonodashError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// Maps a database error to `UniquenessViolation` when it was caused by a unique constraint.
    pub(crate) fn from_insert(error: sqlx::Error, what: impl FnOnce() -> String) -> MonodashError {
        let is_unique = error
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);

        if is_unique {
            MonodashError::UniquenessViolation(what())
        } else {
            MonodashError::Database(error)
        }
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `MonodashResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> MonodashResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}
