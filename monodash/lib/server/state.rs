//! Server state management.

use crate::service::Monodash;

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// Shared server state handed to every request handler.
///
/// The service is cheap to clone; the pool and telemetry capabilities inside are reference
/// counted.
#[derive(Clone)]
pub struct ServerState {
    service: Monodash,
}

//-------------------------------------------------------------------------------------------------
// Methods
//-------------------------------------------------------------------------------------------------

impl ServerState {
    /// Creates a new ServerState around `service`
    pub fn new(service: Monodash) -> Self {
        Self { service }
    }

    /// Gets the dashboard service
    pub fn service(&self) -> &Monodash {
        &self.service
    }
}
