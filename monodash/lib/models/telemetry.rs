use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Instance;

//--------------------------------------------------------------------------------------------------
// Types: Host
//--------------------------------------------------------------------------------------------------

/// One observation of the physical host, as produced by a telemetry source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTelemetrySample {
    /// Hostname of the hypervisor.
    pub hostname: String,

    /// Host uptime in seconds.
    pub uptime: i64,

    /// CPU utilization in percent.
    pub cpu_usage: f64,

    /// Memory utilization in percent.
    pub memory_usage: f64,

    /// Total memory in MB.
    pub total_memory: i64,

    /// Used memory in MB.
    pub used_memory: i64,

    /// The 1, 5 and 15 minute load averages, space separated.
    pub load_average: String,
}

/// A stored host telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTelemetry {
    /// The row id assigned by the store.
    pub id: i64,

    /// Hostname of the hypervisor.
    pub hostname: String,

    /// Host uptime in seconds.
    pub uptime: i64,

    /// CPU utilization in percent.
    pub cpu_usage: f64,

    /// Memory utilization in percent.
    pub memory_usage: f64,

    /// Total memory in MB.
    pub total_memory: i64,

    /// Used memory in MB.
    pub used_memory: i64,

    /// The 1, 5 and 15 minute load averages, space separated.
    pub load_average: String,

    /// When the snapshot was taken.
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------------------------------------------------------------------
// Types: Instance Metrics
//--------------------------------------------------------------------------------------------------

/// Disk and network throughput of an instance in MB/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IoThroughput {
    /// Disk read rate.
    pub disk_read: f64,

    /// Disk write rate.
    pub disk_write: f64,

    /// Inbound network rate.
    pub network_in: f64,

    /// Outbound network rate.
    pub network_out: f64,
}

/// A metric sample that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMetricSample {
    /// Handle of the sampled instance.
    pub handle: i64,

    /// CPU utilization in percent.
    pub cpu_usage: f64,

    /// Memory utilization in percent.
    pub memory_usage: f64,

    /// Memory used in MB.
    pub memory_used: i64,

    /// Disk and network throughput.
    pub io: IoThroughput,
}

/// A stored, time-stamped resource measurement of one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// The row id assigned by the store.
    pub id: i64,

    /// Handle of the sampled instance.
    pub handle: i64,

    /// CPU utilization in percent.
    pub cpu_usage: f64,

    /// Memory utilization in percent.
    pub memory_usage: f64,

    /// Memory used in MB.
    pub memory_used: i64,

    /// Disk read rate in MB/s.
    pub disk_read: f64,

    /// Disk write rate in MB/s.
    pub disk_write: f64,

    /// Inbound network rate in MB/s.
    pub network_in: f64,

    /// Outbound network rate in MB/s.
    pub network_out: f64,

    /// When the sample was recorded.
    pub recorded_at: DateTime<Utc>,
}

//--------------------------------------------------------------------------------------------------
// Types: Dashboard
//--------------------------------------------------------------------------------------------------

/// Instance counts split by kind.
///
/// Paused and suspended instances only show up in the totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSummary {
    /// Number of virtual machines.
    pub total_vms: u32,

    /// Number of running virtual machines.
    pub running_vms: u32,

    /// Number of stopped virtual machines.
    pub stopped_vms: u32,

    /// Number of containers.
    pub total_containers: u32,

    /// Number of running containers.
    pub running_containers: u32,

    /// Number of stopped containers.
    pub stopped_containers: u32,
}

/// The dashboard read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    /// The latest host telemetry snapshot.
    pub host: HostTelemetry,

    /// Instance counts.
    pub vm_summary: InstanceSummary,

    /// The most recently created instances, newest first.
    pub recent_vms: Vec<Instance>,
}
