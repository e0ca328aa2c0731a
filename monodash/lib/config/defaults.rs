use std::{path::PathBuf, sync::LazyLock};

use crate::utils::MONODASH_HOME_DIR;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Default address the HTTP server binds to.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default port for the HTTP server
pub const DEFAULT_SERVER_PORT: u16 = 2022;

/// Hostname reported by the simulated telemetry source.
pub const DEFAULT_SIMULATED_HOSTNAME: &str = "proxmox-server";

/// Total memory in MB reported by the simulated telemetry source.
pub const DEFAULT_SIMULATED_TOTAL_MEMORY: i64 = 32768;

/// Default log level when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The path where all monodash global data is stored.
pub static DEFAULT_MONODASH_HOME: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(MONODASH_HOME_DIR)
});
