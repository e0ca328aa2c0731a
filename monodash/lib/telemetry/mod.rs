//! Sources of host telemetry and instance I/O throughput.
//!
//! The dashboard never talks to a hypervisor directly. Host snapshots come from a
//! [`TelemetrySource`] and per-instance disk and network rates from an [`IoSampler`], so a
//! simulator, the local machine or a test double can sit behind the same service.

mod io;
mod simulated;
mod system;

use crate::{models::HostTelemetrySample, MonodashResult};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Produces one observation of the host per call.
pub trait TelemetrySource: Send + Sync {
    /// Takes a new sample.
    fn sample(&self) -> MonodashResult<HostTelemetrySample>;
}

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use io::*;
pub use simulated::*;
pub use system::*;
