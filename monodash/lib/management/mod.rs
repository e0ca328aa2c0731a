//! Persistence for the dashboard: the SQLite pool, migrations and the record stores for
//! instances, host telemetry and metric samples.

mod db;
mod instance;
mod telemetry;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use db::*;
pub use instance::*;
pub use telemetry::*;
