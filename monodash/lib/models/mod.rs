//! Data model of the dashboard: instances, host telemetry, metric samples and the
//! request types accepted by the service.

mod instance;
mod request;
mod telemetry;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use instance::*;
pub use request::*;
pub use telemetry::*;
