use std::path::{Path, PathBuf};

use crate::config::DEFAULT_MONODASH_HOME;

use super::{MONODASH_CONFIG_FILENAME, MONODASH_DB_FILENAME};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Environment variable overriding the monodash home directory.
pub const MONODASH_HOME_ENV_VAR: &str = "MONODASH_HOME";

/// Environment variable pointing at the configuration file.
pub const MONODASH_CONFIG_ENV_VAR: &str = "MONODASH_CONFIG";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the monodash home directory.
///
/// Reads `MONODASH_HOME` and falls back to `~/.monodash`.
pub fn get_monodash_home_path() -> PathBuf {
    match std::env::var(MONODASH_HOME_ENV_VAR) {
        Ok(home) if !home.trim().is_empty() => PathBuf::from(home),
        _ => DEFAULT_MONODASH_HOME.to_path_buf(),
    }
}

/// Returns the configuration file to load and whether it was asked for explicitly.
///
/// An explicit path wins over `MONODASH_CONFIG`, which wins over the file in the home directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> (PathBuf, bool) {
    if let Some(path) = explicit {
        return (path.to_path_buf(), true);
    }

    match std::env::var(MONODASH_CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => (PathBuf::from(path), true),
        _ => (get_monodash_home_path().join(MONODASH_CONFIG_FILENAME), false),
    }
}

/// Returns the default database location inside `home`.
pub fn default_db_path(home: &Path) -> PathBuf {
    home.join(MONODASH_DB_FILENAME)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
