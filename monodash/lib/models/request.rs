use serde::{Deserialize, Serialize};

use crate::{MonodashError, MonodashResult};

use super::{HostTelemetrySample, InstanceKind, LifecycleAction};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Cores given to an instance created without an explicit core count.
pub const DEFAULT_CPU_CORES: i64 = 1;

/// Default lookback window of a metrics query, in hours.
pub const DEFAULT_METRICS_HOURS: i64 = 1;

/// Longest lookback window of a metrics query, in hours.
pub const MAX_METRICS_HOURS: i64 = 24;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Input of the create instance operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInstanceRequest {
    /// The unique handle of the new instance.
    #[serde(alias = "vmid")]
    pub handle: i64,

    /// Human readable name.
    pub name: String,

    /// Virtual machine or container.
    #[serde(alias = "type")]
    pub kind: InstanceKind,

    /// Number of cores, defaults to one.
    #[serde(default)]
    pub cpu_cores: Option<i64>,

    /// Allocated memory in MB.
    pub memory_allocated: i64,

    /// Disk size in GB.
    pub disk_size: i64,
}

/// Input of the update instance operation. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateInstanceRequest {
    /// The row id of the instance.
    pub id: i64,

    /// New name.
    #[serde(default)]
    pub name: Option<String>,

    /// New core count.
    #[serde(default)]
    pub cpu_cores: Option<i64>,

    /// New memory allocation in MB.
    #[serde(default)]
    pub memory_allocated: Option<i64>,

    /// New disk size in GB.
    #[serde(default)]
    pub disk_size: Option<i64>,

    /// Version the caller last read. When set, the edit only applies if the row is
    /// still at this version.
    #[serde(default)]
    pub version: Option<i64>,
}

/// Input of the perform action operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// The handle of the instance.
    #[serde(alias = "vmid")]
    pub handle: i64,

    /// The action to apply.
    pub action: LifecycleAction,
}

/// Input of the metrics query operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsQuery {
    /// The handle of the instance.
    #[serde(alias = "vmid")]
    pub handle: i64,

    /// Lookback window in whole hours, 1 to 24. Defaults to 1.
    #[serde(default)]
    pub hours: Option<i64>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CreateInstanceRequest {
    /// Checks the request and returns the core count to store.
    pub fn validate(&self) -> MonodashResult<i64> {
        validate_handle(self.handle)?;
        validate_name(&self.name)?;
        let cpu_cores = self.cpu_cores.unwrap_or(DEFAULT_CPU_CORES);
        validate_positive("cpu_cores", cpu_cores)?;
        validate_positive("memory_allocated", self.memory_allocated)?;
        validate_positive("disk_size", self.disk_size)?;
        Ok(cpu_cores)
    }
}

impl UpdateInstanceRequest {
    /// Checks the request.
    pub fn validate(&self) -> MonodashResult<()> {
        validate_id("id", self.id)?;
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(cpu_cores) = self.cpu_cores {
            validate_positive("cpu_cores", cpu_cores)?;
        }
        if let Some(memory_allocated) = self.memory_allocated {
            validate_positive("memory_allocated", memory_allocated)?;
        }
        if let Some(disk_size) = self.disk_size {
            validate_positive("disk_size", disk_size)?;
        }
        if let Some(version) = self.version {
            validate_non_negative("version", version)?;
        }
        Ok(())
    }

    /// Returns `true` if the request changes no attribute.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cpu_cores.is_none()
            && self.memory_allocated.is_none()
            && self.disk_size.is_none()
    }
}

impl MetricsQuery {
    /// Checks the query and returns the effective lookback window in hours.
    pub fn validate(&self) -> MonodashResult<i64> {
        validate_handle(self.handle)?;
        let hours = self.hours.unwrap_or(DEFAULT_METRICS_HOURS);
        if !(1..=MAX_METRICS_HOURS).contains(&hours) {
            return Err(MonodashError::Validation(format!(
                "hours must be between 1 and {}, got {}",
                MAX_METRICS_HOURS, hours
            )));
        }
        Ok(hours)
    }
}

impl HostTelemetrySample {
    /// Checks that the sample describes a plausible host.
    pub fn validate(&self) -> MonodashResult<()> {
        if self.hostname.trim().is_empty() {
            return Err(MonodashError::Validation(
                "hostname must not be empty".to_string(),
            ));
        }
        validate_non_negative("uptime", self.uptime)?;
        validate_percentage("cpu_usage", self.cpu_usage)?;
        validate_percentage("memory_usage", self.memory_usage)?;
        validate_non_negative("total_memory", self.total_memory)?;
        validate_non_negative("used_memory", self.used_memory)?;
        if self.used_memory > self.total_memory {
            return Err(MonodashError::Validation(format!(
                "used_memory ({}) exceeds total_memory ({})",
                self.used_memory, self.total_memory
            )));
        }

        let loads: Vec<&str> = self.load_average.split_whitespace().collect();
        let well_formed = loads.len() == 3
            && loads
                .iter()
                .all(|l| l.parse::<f64>().is_ok_and(|v| v.is_finite() && v >= 0.0));
        if !well_formed {
            return Err(MonodashError::Validation(format!(
                "load_average must hold three non-negative numbers, got '{}'",
                self.load_average
            )));
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Checks that an instance handle is positive.
pub fn validate_handle(handle: i64) -> MonodashResult<()> {
    validate_id("handle", handle)
}

fn validate_id(field: &str, value: i64) -> MonodashResult<()> {
    if value <= 0 {
        return Err(MonodashError::Validation(format!(
            "{} must be a positive integer, got {}",
            field, value
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> MonodashResult<()> {
    if name.trim().is_empty() {
        return Err(MonodashError::Validation(
            "name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_positive(field: &str, value: i64) -> MonodashResult<()> {
    if value <= 0 {
        return Err(MonodashError::Validation(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: i64) -> MonodashResult<()> {
    if value < 0 {
        return Err(MonodashError::Validation(format!(
            "{} must not be negative, got {}",
            field, value
        )));
    }
    Ok(())
}

fn validate_percentage(field: &str, value: f64) -> MonodashResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(MonodashError::Validation(format!(
            "{} must be between 0 and 100, got {}",
            field, value
        )));
    }
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
