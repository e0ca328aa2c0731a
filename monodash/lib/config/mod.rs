//! Configuration types and helpers.

mod defaults;
mod monodash;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use defaults::*;
pub use monodash::*;
