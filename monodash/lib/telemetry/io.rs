use crate::models::{Instance, IoThroughput};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Supplies the disk and network throughput of an instance when a metric sample is recorded.
pub trait IoSampler: Send + Sync {
    /// Returns the current throughput of `instance`.
    fn sample(&self, instance: &Instance) -> IoThroughput;
}

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Reports zero throughput for every instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroIo;

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl IoSampler for ZeroIo {
    fn sample(&self, _instance: &Instance) -> IoThroughput {
        IoThroughput::default()
    }
}
