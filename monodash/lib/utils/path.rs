//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The directory under the user's home where monodash keeps its data by default.
pub const MONODASH_HOME_DIR: &str = ".monodash";

/// The configuration file name inside the monodash home directory.
pub const MONODASH_CONFIG_FILENAME: &str = "monodash.yaml";

/// The database file name inside the monodash home directory.
pub const MONODASH_DB_FILENAME: &str = "monodash.db";

/// The prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "monodash.log";
