use std::sync::Mutex;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{DEFAULT_SIMULATED_HOSTNAME, DEFAULT_SIMULATED_TOTAL_MEMORY},
    models::HostTelemetrySample,
    MonodashError, MonodashResult,
};

use super::TelemetrySource;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Upper bound (exclusive) of a simulated host uptime in seconds.
const MAX_SIMULATED_UPTIME: i64 = 1_000_000;

/// Upper bound (exclusive) of each simulated load average value.
const MAX_SIMULATED_LOAD: f64 = 2.0;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Generates random but plausible host telemetry.
///
/// With a seed the sequence of samples is reproducible.
#[derive(Debug)]
pub struct SimulatedTelemetry {
    hostname: String,
    total_memory: i64,
    rng: Mutex<StdRng>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SimulatedTelemetry {
    /// Creates a simulator for a host with the given name and total memory in MB.
    pub fn new(
        hostname: impl Into<String>,
        total_memory: i64,
        seed: Option<u64>,
    ) -> MonodashResult<Self> {
        let hostname = hostname.into();
        if hostname.trim().is_empty() {
            return Err(MonodashError::Validation(
                "hostname must not be empty".to_string(),
            ));
        }

        if total_memory <= 0 {
            return Err(MonodashError::Validation(format!(
                "total_memory must be positive, got {}",
                total_memory
            )));
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            hostname,
            total_memory,
            rng: Mutex::new(rng),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for SimulatedTelemetry {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_SIMULATED_HOSTNAME.to_string(),
            total_memory: DEFAULT_SIMULATED_TOTAL_MEMORY,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl TelemetrySource for SimulatedTelemetry {
    fn sample(&self) -> MonodashResult<HostTelemetrySample> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| MonodashError::custom(anyhow::anyhow!("telemetry rng lock poisoned")))?;

        let used_memory = rng.random_range(0..=self.total_memory);
        let memory_usage = used_memory as f64 / self.total_memory as f64 * 100.0;
        let loads: Vec<String> = (0..3)
            .map(|_| format!("{:.2}", rng.random_range(0.0..MAX_SIMULATED_LOAD)))
            .collect();

        Ok(HostTelemetrySample {
            hostname: self.hostname.clone(),
            uptime: rng.random_range(0..MAX_SIMULATED_UPTIME),
            cpu_usage: rng.random_range(0.0..100.0),
            memory_usage,
            total_memory: self.total_memory,
            used_memory,
            load_average: loads.join(" "),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
