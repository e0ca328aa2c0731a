use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MonodashError;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// CPU usage reported right after an instance starts, reboots or resumes.
pub const BOOT_CPU_USAGE: f64 = 5.0;

/// Memory usage reported right after an instance starts or reboots.
pub const BOOT_MEMORY_USAGE: f64 = 25.0;

/// CPU usage of a paused instance.
pub const PAUSED_CPU_USAGE: f64 = 0.0;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The kind of workload an instance runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceKind {
    /// A full virtual machine.
    #[serde(rename = "qemu", alias = "vm")]
    VirtualMachine,

    /// A system container.
    #[serde(rename = "lxc", alias = "container")]
    Container,
}

/// The lifecycle status of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// The instance is running.
    Running,

    /// The instance is stopped. It carries no usage.
    Stopped,

    /// The instance is paused and keeps its memory footprint.
    Paused,

    /// The instance is suspended. No action leads into or out of this status.
    Suspended,
}

/// An action that drives the instance lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    /// Boot a stopped instance.
    Start,

    /// Power off a running or paused instance.
    Stop,

    /// Restart a running instance.
    Reboot,

    /// Freeze a running instance.
    Pause,

    /// Unfreeze a paused instance.
    Resume,
}

/// Resource usage of an instance that is not stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// CPU utilization in percent.
    pub cpu_usage: f64,

    /// Memory utilization in percent.
    pub memory_usage: f64,

    /// Memory used in MB.
    pub memory_used: i64,

    /// Uptime in seconds.
    pub uptime: i64,
}

/// A virtual machine or container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// The row id assigned by the store.
    pub id: i64,

    /// The externally visible unique handle (the hypervisor's vmid).
    pub handle: i64,

    /// Human readable name.
    pub name: String,

    /// Virtual machine or container.
    pub kind: InstanceKind,

    /// Current lifecycle status.
    pub status: InstanceStatus,

    /// Resource usage; `None` exactly when the instance is stopped.
    pub usage: Option<UsageSnapshot>,

    /// Allocated memory in MB.
    pub memory_allocated: i64,

    /// Number of virtual CPU cores.
    pub cpu_cores: i64,

    /// Disk size in GB.
    pub disk_size: i64,

    /// Write counter used for optimistic concurrency.
    pub version: i64,

    /// When the instance was created.
    pub created_at: DateTime<Utc>,

    /// When the instance was last modified.
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl InstanceKind {
    /// Returns the name used on the wire and in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceKind::VirtualMachine => "qemu",
            InstanceKind::Container => "lxc",
        }
    }
}

impl InstanceStatus {
    /// Returns the lowercase name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Paused => "paused",
            InstanceStatus::Suspended => "suspended",
        }
    }
}

impl LifecycleAction {
    /// Returns the lowercase name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Reboot => "reboot",
            LifecycleAction::Pause => "pause",
            LifecycleAction::Resume => "resume",
        }
    }
}

impl UsageSnapshot {
    /// Usage of a freshly booted instance: 5% CPU, 25% of the allocated memory, zero uptime.
    pub fn booted(memory_allocated: i64) -> Self {
        Self {
            cpu_usage: BOOT_CPU_USAGE,
            memory_usage: BOOT_MEMORY_USAGE,
            memory_used: memory_allocated / 4,
            uptime: 0,
        }
    }
}

impl Instance {
    /// Returns `true` if `usage` agrees with `status`.
    pub fn usage_matches_status(&self) -> bool {
        match self.status {
            InstanceStatus::Stopped => self.usage.is_none(),
            InstanceStatus::Running | InstanceStatus::Paused => self.usage.is_some(),
            InstanceStatus::Suspended => true,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceKind {
    type Err = MonodashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qemu" | "vm" => Ok(InstanceKind::VirtualMachine),
            "lxc" | "container" => Ok(InstanceKind::Container),
            _ => Err(MonodashError::Validation(format!(
                "unknown instance kind '{}', expected 'qemu' or 'lxc'",
                s
            ))),
        }
    }
}

impl FromStr for InstanceStatus {
    type Err = MonodashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(InstanceStatus::Running),
            "stopped" => Ok(InstanceStatus::Stopped),
            "paused" => Ok(InstanceStatus::Paused),
            "suspended" => Ok(InstanceStatus::Suspended),
            _ => Err(MonodashError::Validation(format!(
                "unknown instance status '{}'",
                s
            ))),
        }
    }
}

impl FromStr for LifecycleAction {
    type Err = MonodashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(LifecycleAction::Start),
            "stop" => Ok(LifecycleAction::Stop),
            "reboot" => Ok(LifecycleAction::Reboot),
            "pause" => Ok(LifecycleAction::Pause),
            "resume" => Ok(LifecycleAction::Resume),
            _ => Err(MonodashError::Validation(format!(
                "unknown action '{}', expected one of start, stop, reboot, pause, resume",
                s
            ))),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booted_usage_takes_a_quarter_of_allocated_memory() {
        let usage = UsageSnapshot::booted(2048);
        assert_eq!(usage.memory_used, 512);
        assert_eq!(usage.cpu_usage, 5.0);
        assert_eq!(usage.memory_usage, 25.0);
        assert_eq!(usage.uptime, 0);

        // Rounds down
        assert_eq!(UsageSnapshot::booted(1023).memory_used, 255);
    }

    #[test]
    fn test_kind_wire_names() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&InstanceKind::VirtualMachine)?, "\"qemu\"");
        assert_eq!(serde_json::to_string(&InstanceKind::Container)?, "\"lxc\"");
        assert_eq!(
            serde_json::from_str::<InstanceKind>("\"container\"")?,
            InstanceKind::Container
        );
        assert_eq!("vm".parse::<InstanceKind>()?, InstanceKind::VirtualMachine);
        Ok(())
    }

    #[test]
    fn test_unknown_action_is_a_validation_error() {
        let err = "destroy".parse::<LifecycleAction>().unwrap_err();
        assert!(matches!(err, MonodashError::Validation(_)));
        assert!(err.to_string().contains("destroy"));
    }
}
