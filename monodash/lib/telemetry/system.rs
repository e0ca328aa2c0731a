use std::sync::Mutex;

use sysinfo::System;

use crate::{models::HostTelemetrySample, MonodashError, MonodashResult};

use super::TelemetrySource;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const BYTES_PER_MB: u64 = 1024 * 1024;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Reads telemetry of the machine the service runs on.
///
/// CPU usage is measured between consecutive samples, so the collector is primed once on
/// creation and the first sample reports usage since then.
#[derive(Debug)]
pub struct SystemTelemetry {
    hostname: Option<String>,
    system: Mutex<System>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SystemTelemetry {
    /// Creates a collector. `hostname` overrides the name reported by the operating system.
    pub fn new(hostname: Option<String>) -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            hostname,
            system: Mutex::new(system),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for SystemTelemetry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TelemetrySource for SystemTelemetry {
    fn sample(&self) -> MonodashResult<HostTelemetrySample> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| MonodashError::custom(anyhow::anyhow!("system telemetry lock poisoned")))?;

        system.refresh_cpu_usage();
        system.refresh_memory();

        let total_memory = (system.total_memory() / BYTES_PER_MB) as i64;
        let used_memory = ((system.used_memory() / BYTES_PER_MB) as i64).min(total_memory);
        let memory_usage = if total_memory > 0 {
            used_memory as f64 / total_memory as f64 * 100.0
        } else {
            0.0
        };

        let load = System::load_average();
        let hostname = self
            .hostname
            .clone()
            .or_else(System::host_name)
            .unwrap_or_else(|| "localhost".to_string());

        let sample = HostTelemetrySample {
            hostname,
            uptime: System::uptime() as i64,
            cpu_usage: finite_or_zero(system.global_cpu_usage() as f64).clamp(0.0, 100.0),
            memory_usage,
            total_memory,
            used_memory,
            load_average: format!(
                "{:.2} {:.2} {:.2}",
                finite_or_zero(load.one).max(0.0),
                finite_or_zero(load.five).max(0.0),
                finite_or_zero(load.fifteen).max(0.0)
            ),
        };

        tracing::trace!(?sample, "sampled local host");
        Ok(sample)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// sysinfo reports NaN before it has two readings to compare.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_sample_is_valid() -> MonodashResult<()> {
        let source = SystemTelemetry::new(Some("test-host".to_string()));
        let sample = source.sample()?;
        assert_eq!(sample.hostname, "test-host");
        sample.validate()?;
        Ok(())
    }

    #[test]
    fn test_non_finite_readings_become_zero() {
        assert_eq!(finite_or_zero(f64::NAN).clamp(0.0, 100.0), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(f64::NEG_INFINITY), 0.0);
        assert_eq!(finite_or_zero(42.5), 42.5);
    }
}
