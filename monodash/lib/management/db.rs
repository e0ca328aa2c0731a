use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{migrate::Migrator, sqlite::SqlitePoolOptions, Pool, Sqlite};
use tokio::fs;

use crate::MonodashResult;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Migrator for the dashboard database
pub static MONODASH_DB_MIGRATOR: Migrator = sqlx::migrate!("lib/management/migrations/monodash");

/// Default number of pooled connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Initializes a new SQLite database if it doesn't already exist at the specified path.
///
/// ## Arguments
///
/// * `db_path` - Path where the SQLite database file should be created
/// * `migrator` - SQLx migrator containing database schema migrations to run
/// * `max_connections` - Upper bound of the connection pool
pub async fn init_db(
    db_path: impl AsRef<Path>,
    migrator: &Migrator,
    max_connections: u32,
) -> MonodashResult<Pool<Sqlite>> {
    let db_path = db_path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    // Create an empty database file if it doesn't exist
    if !db_path.exists() {
        fs::File::create(&db_path).await?;
    }

    let pool = get_db_pool(db_path, max_connections).await?;

    // Run migrations
    migrator.run(&pool).await?;
    tracing::debug!(path = %db_path.display(), "database ready");

    Ok(pool)
}

/// Creates and returns a connection pool for SQLite database operations.
pub async fn get_db_pool(
    db_path: impl AsRef<Path>,
    max_connections: u32,
) -> MonodashResult<Pool<Sqlite>> {
    let db_path = db_path.as_ref();
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
        .await?;

    Ok(pool)
}

/// Gets an existing database connection pool, creating the database and running the
/// migrations first if needed.
pub async fn get_or_create_db_pool(
    db_path: impl AsRef<Path>,
    max_connections: u32,
) -> MonodashResult<Pool<Sqlite>> {
    init_db(&db_path, &MONODASH_DB_MIGRATOR, max_connections).await
}

/// Formats a timestamp the way it is stored.
///
/// Fixed width with microsecond precision, so textual order is chronological order.
pub(crate) fn to_db_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::Row;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_db_creates_tables() -> MonodashResult<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("nested").join("monodash.db");

        let pool = get_or_create_db_pool(&db_path, DEFAULT_MAX_CONNECTIONS).await?;
        assert!(db_path.exists());

        let tables = sqlx::query("SELECT name FROM sqlite_master WHERE type='table'")
            .fetch_all(&pool)
            .await?;

        let table_names: Vec<String> = tables
            .iter()
            .map(|row| row.get::<String, _>("name"))
            .collect();

        for table in ["instances", "host_telemetry", "metric_samples"] {
            assert!(
                table_names.contains(&table.to_string()),
                "{} table not found",
                table
            );
        }

        // Running the migrations again is harmless
        get_or_create_db_pool(&db_path, DEFAULT_MAX_CONNECTIONS).await?;

        Ok(())
    }

    #[test]
    fn test_db_timestamps_sort_chronologically() {
        let whole = Utc.with_ymd_and_hms(2026, 10, 15, 10, 0, 0).unwrap();
        let later = whole + chrono::Duration::microseconds(1);

        let a = to_db_timestamp(&whole);
        let b = to_db_timestamp(&later);
        assert_eq!(a, "2026-10-15T10:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }
}
