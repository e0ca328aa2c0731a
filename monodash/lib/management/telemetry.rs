//! Host telemetry and per-instance metric sample tables. Both are append only.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::{
    models::{HostTelemetry, HostTelemetrySample, MetricSample, NewMetricSample},
    MonodashResult,
};

use super::db::to_db_timestamp;

//--------------------------------------------------------------------------------------------------
// Functions: Host Telemetry
//--------------------------------------------------------------------------------------------------

/// Appends a host telemetry snapshot.
pub async fn insert_host_telemetry(
    pool: &Pool<Sqlite>,
    sample: &HostTelemetrySample,
    observed_at: DateTime<Utc>,
) -> MonodashResult<HostTelemetry> {
    let row = sqlx::query(
        r#"
        INSERT INTO host_telemetry (
            hostname, uptime, cpu_usage, memory_usage,
            total_memory, used_memory, load_average, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&sample.hostname)
    .bind(sample.uptime)
    .bind(sample.cpu_usage)
    .bind(sample.memory_usage)
    .bind(sample.total_memory)
    .bind(sample.used_memory)
    .bind(&sample.load_average)
    .bind(to_db_timestamp(&observed_at))
    .fetch_one(pool)
    .await?;

    host_telemetry_from_row(&row)
}

/// Returns the most recently inserted host telemetry snapshot.
pub async fn latest_host_telemetry(pool: &Pool<Sqlite>) -> MonodashResult<Option<HostTelemetry>> {
    let row = sqlx::query("SELECT * FROM host_telemetry ORDER BY id DESC LIMIT 1")
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(host_telemetry_from_row).transpose()
}

fn host_telemetry_from_row(row: &SqliteRow) -> MonodashResult<HostTelemetry> {
    Ok(HostTelemetry {
        id: row.try_get("id")?,
        hostname: row.try_get("hostname")?,
        uptime: row.try_get("uptime")?,
        cpu_usage: row.try_get("cpu_usage")?,
        memory_usage: row.try_get("memory_usage")?,
        total_memory: row.try_get("total_memory")?,
        used_memory: row.try_get("used_memory")?,
        load_average: row.try_get("load_average")?,
        updated_at: row.try_get("updated_at")?,
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Metric Samples
//--------------------------------------------------------------------------------------------------

/// Appends a metric sample recorded at `recorded_at`.
pub async fn insert_metric_sample(
    pool: &Pool<Sqlite>,
    sample: &NewMetricSample,
    recorded_at: DateTime<Utc>,
) -> MonodashResult<MetricSample> {
    let row = sqlx::query(
        r#"
        INSERT INTO metric_samples (
            handle, cpu_usage, memory_usage, memory_used,
            disk_read, disk_write, network_in, network_out,
            recorded_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(sample.handle)
    .bind(sample.cpu_usage)
    .bind(sample.memory_usage)
    .bind(sample.memory_used)
    .bind(sample.io.disk_read)
    .bind(sample.io.disk_write)
    .bind(sample.io.network_in)
    .bind(sample.io.network_out)
    .bind(to_db_timestamp(&recorded_at))
    .fetch_one(pool)
    .await?;

    metric_sample_from_row(&row)
}

/// Returns the samples of `handle` recorded at or after `since`, newest first.
pub async fn metric_samples_since(
    pool: &Pool<Sqlite>,
    handle: i64,
    since: DateTime<Utc>,
) -> MonodashResult<Vec<MetricSample>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM metric_samples
        WHERE handle = ? AND recorded_at >= ?
        ORDER BY recorded_at DESC, id DESC
        "#,
    )
    .bind(handle)
    .bind(to_db_timestamp(&since))
    .fetch_all(pool)
    .await?;

    rows.iter().map(metric_sample_from_row).collect()
}

fn metric_sample_from_row(row: &SqliteRow) -> MonodashResult<MetricSample> {
    Ok(MetricSample {
        id: row.try_get("id")?,
        handle: row.try_get("handle")?,
        cpu_usage: row.try_get("cpu_usage")?,
        memory_usage: row.try_get("memory_usage")?,
        memory_used: row.try_get("memory_used")?,
        disk_read: row.try_get("disk_read")?,
        disk_write: row.try_get("disk_write")?,
        network_in: row.try_get("network_in")?,
        network_out: row.try_get("network_out")?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
