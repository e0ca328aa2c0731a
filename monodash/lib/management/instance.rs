//! Instance record store.
//!
//! Instances live in the `instances` table. Every write bumps the row's `version` so that
//! read-modify-write cycles can detect a concurrent writer instead of silently overwriting it.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::{
    models::{
        CreateInstanceRequest, Instance, InstanceKind, InstanceStatus, UpdateInstanceRequest,
        UsageSnapshot,
    },
    MonodashError, MonodashResult,
};

use super::db::to_db_timestamp;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const INSTANCE_COLUMNS: &str = r#"
    id, handle, name, kind, status,
    cpu_usage, memory_usage, memory_used, uptime,
    memory_allocated, cpu_cores, disk_size,
    version, created_at, updated_at
"#;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Inserts a new stopped instance and returns it.
///
/// Fails with `UniquenessViolation` if the handle is already taken.
pub async fn insert_instance(
    pool: &Pool<Sqlite>,
    request: &CreateInstanceRequest,
    cpu_cores: i64,
    now: DateTime<Utc>,
) -> MonodashResult<Instance> {
    let now = to_db_timestamp(&now);
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO instances (
            handle, name, kind, status,
            memory_allocated, cpu_cores, disk_size,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {INSTANCE_COLUMNS}
        "#
    ))
    .bind(request.handle)
    .bind(request.name.trim())
    .bind(request.kind.as_str())
    .bind(InstanceStatus::Stopped.as_str())
    .bind(request.memory_allocated)
    .bind(cpu_cores)
    .bind(request.disk_size)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        MonodashError::from_insert(e, || {
            format!("an instance with handle {} already exists", request.handle)
        })
    })?;

    instance_from_row(&row)
}

/// Looks up an instance by its handle.
pub async fn get_instance_by_handle(
    pool: &Pool<Sqlite>,
    handle: i64,
) -> MonodashResult<Option<Instance>> {
    let row = sqlx::query(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM instances WHERE handle = ?"
    ))
    .bind(handle)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(instance_from_row).transpose()
}

/// Looks up an instance by its row id.
pub async fn get_instance_by_id(pool: &Pool<Sqlite>, id: i64) -> MonodashResult<Option<Instance>> {
    let row = sqlx::query(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM instances WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(instance_from_row).transpose()
}

/// Returns all instances, newest created first.
pub async fn list_instances(pool: &Pool<Sqlite>) -> MonodashResult<Vec<Instance>> {
    let rows = sqlx::query(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM instances ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(instance_from_row).collect()
}

/// Returns at most `limit` instances, newest created first. Ties go to the later insert.
pub async fn recent_instances(pool: &Pool<Sqlite>, limit: u32) -> MonodashResult<Vec<Instance>> {
    let rows = sqlx::query(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM instances ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(instance_from_row).collect()
}

/// Counts instances grouped by kind and status.
pub async fn count_instances(
    pool: &Pool<Sqlite>,
) -> MonodashResult<Vec<(InstanceKind, InstanceStatus, u32)>> {
    let rows = sqlx::query(
        r#"
        SELECT kind, status, COUNT(*) AS total
        FROM instances
        GROUP BY kind, status
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> MonodashResult<_> {
            let kind = row.try_get::<String, _>("kind")?.parse()?;
            let status = row.try_get::<String, _>("status")?.parse()?;
            let total = row.try_get::<u32, _>("total")?;
            Ok((kind, status, total))
        })
        .collect()
}

/// Applies an attribute edit in a single statement. Absent fields keep their value.
///
/// Returns `None` if no instance has the given row id, or if `request.version` is set and
/// the row has moved past it.
pub async fn update_instance_attributes(
    pool: &Pool<Sqlite>,
    request: &UpdateInstanceRequest,
    now: DateTime<Utc>,
) -> MonodashResult<Option<Instance>> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE instances
        SET name = COALESCE(?, name),
            cpu_cores = COALESCE(?, cpu_cores),
            memory_allocated = COALESCE(?, memory_allocated),
            disk_size = COALESCE(?, disk_size),
            version = version + 1,
            updated_at = ?
        WHERE id = ? AND (? IS NULL OR version = ?)
        RETURNING {INSTANCE_COLUMNS}
        "#
    ))
    .bind(request.name.as_deref().map(str::trim))
    .bind(request.cpu_cores)
    .bind(request.memory_allocated)
    .bind(request.disk_size)
    .bind(to_db_timestamp(&now))
    .bind(request.id)
    .bind(request.version)
    .bind(request.version)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(instance_from_row).transpose()
}

/// Persists the status and usage of `instance`, provided the stored row still carries
/// `instance.version`.
///
/// Returns `None` when the row was modified since it was read.
pub async fn save_instance_state(
    pool: &Pool<Sqlite>,
    instance: &Instance,
    now: DateTime<Utc>,
) -> MonodashResult<Option<Instance>> {
    let usage = instance.usage;
    let row = sqlx::query(&format!(
        r#"
        UPDATE instances
        SET status = ?,
            cpu_usage = ?,
            memory_usage = ?,
            memory_used = ?,
            uptime = ?,
            version = version + 1,
            updated_at = ?
        WHERE id = ? AND version = ?
        RETURNING {INSTANCE_COLUMNS}
        "#
    ))
    .bind(instance.status.as_str())
    .bind(usage.map(|u| u.cpu_usage))
    .bind(usage.map(|u| u.memory_usage))
    .bind(usage.map(|u| u.memory_used))
    .bind(usage.map(|u| u.uptime))
    .bind(to_db_timestamp(&now))
    .bind(instance.id)
    .bind(instance.version)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(instance_from_row).transpose()
}

/// Decodes an instance row, rejecting rows whose usage columns disagree with the status.
fn instance_from_row(row: &SqliteRow) -> MonodashResult<Instance> {
    let handle: i64 = row.try_get("handle")?;
    let usage = match (
        row.try_get::<Option<f64>, _>("cpu_usage")?,
        row.try_get::<Option<f64>, _>("memory_usage")?,
        row.try_get::<Option<i64>, _>("memory_used")?,
        row.try_get::<Option<i64>, _>("uptime")?,
    ) {
        (Some(cpu_usage), Some(memory_usage), Some(memory_used), Some(uptime)) => {
            Some(UsageSnapshot {
                cpu_usage,
                memory_usage,
                memory_used,
                uptime,
            })
        }
        (None, None, None, None) => None,
        _ => {
            return Err(MonodashError::CorruptRecord(format!(
                "instance {} has partially populated usage",
                handle
            )))
        }
    };

    let instance = Instance {
        id: row.try_get("id")?,
        handle,
        name: row.try_get("name")?,
        kind: row.try_get::<String, _>("kind")?.parse()?,
        status: row.try_get::<String, _>("status")?.parse()?,
        usage,
        memory_allocated: row.try_get("memory_allocated")?,
        cpu_cores: row.try_get("cpu_cores")?,
        disk_size: row.try_get("disk_size")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    };

    if !instance.usage_matches_status() {
        return Err(MonodashError::CorruptRecord(format!(
            "instance {} is {} but usage is {}",
            handle,
            instance.status,
            if instance.usage.is_some() {
                "present"
            } else {
                "absent"
            }
        )));
    }

    Ok(instance)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::{get_or_create_db_pool, DEFAULT_MAX_CONNECTIONS};
    use chrono::Duration;
    use tempfile::{tempdir, TempDir};

    async fn test_pool() -> MonodashResult<(TempDir, Pool<Sqlite>)> {
        let temp_dir = tempdir()?;
        let pool =
            get_or_create_db_pool(temp_dir.path().join("test.db"), DEFAULT_MAX_CONNECTIONS)
                .await?;
        Ok((temp_dir, pool))
    }

    fn request(handle: i64) -> CreateInstanceRequest {
        CreateInstanceRequest {
            handle,
            name: format!("vm-{}", handle),
            kind: InstanceKind::VirtualMachine,
            cpu_cores: None,
            memory_allocated: 2048,
            disk_size: 20,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() -> MonodashResult<()> {
        let (_dir, pool) = test_pool().await?;
        let now = Utc::now();

        let created = insert_instance(&pool, &request(100), 2, now).await?;
        assert_eq!(created.handle, 100);
        assert_eq!(created.status, InstanceStatus::Stopped);
        assert_eq!(created.usage, None);
        assert_eq!(created.cpu_cores, 2);
        assert_eq!(created.version, 0);

        let by_handle = get_instance_by_handle(&pool, 100).await?;
        assert_eq!(by_handle.as_ref(), Some(&created));

        let by_id = get_instance_by_id(&pool, created.id).await?;
        assert_eq!(by_id, Some(created));

        assert_eq!(get_instance_by_handle(&pool, 101).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_handle_is_a_uniqueness_violation() -> MonodashResult<()> {
        let (_dir, pool) = test_pool().await?;
        insert_instance(&pool, &request(100), 1, Utc::now()).await?;

        let err = insert_instance(&pool, &request(100), 1, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, MonodashError::UniquenessViolation(_)));
        assert!(err.to_string().contains("100"));
        Ok(())
    }

    #[tokio::test]
    async fn test_recent_instances_break_ties_by_insert_order() -> MonodashResult<()> {
        let (_dir, pool) = test_pool().await?;
        let same_time = Utc::now();
        for handle in 1..=3 {
            insert_instance(&pool, &request(handle), 1, same_time).await?;
        }
        insert_instance(&pool, &request(4), 1, same_time - Duration::hours(1)).await?;

        let handles: Vec<i64> = recent_instances(&pool, 3)
            .await?
            .iter()
            .map(|i| i.handle)
            .collect();
        assert_eq!(handles, vec![3, 2, 1]);

        let all: Vec<i64> = list_instances(&pool)
            .await?
            .iter()
            .map(|i| i.handle)
            .collect();
        assert_eq!(all, vec![3, 2, 1, 4]);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_state_detects_stale_version() -> MonodashResult<()> {
        let (_dir, pool) = test_pool().await?;
        let mut instance = insert_instance(&pool, &request(100), 1, Utc::now()).await?;

        instance.status = InstanceStatus::Running;
        instance.usage = Some(UsageSnapshot::booted(instance.memory_allocated));
        let saved = save_instance_state(&pool, &instance, Utc::now())
            .await?
            .expect("row should match the read version");
        assert_eq!(saved.version, 1);
        assert_eq!(saved.status, InstanceStatus::Running);

        // `instance` still carries version 0
        let stale = save_instance_state(&pool, &instance, Utc::now()).await?;
        assert_eq!(stale, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_attributes_keeps_absent_fields() -> MonodashResult<()> {
        let (_dir, pool) = test_pool().await?;
        let created = insert_instance(&pool, &request(100), 1, Utc::now()).await?;

        let update = UpdateInstanceRequest {
            id: created.id,
            name: Some("renamed".to_string()),
            memory_allocated: Some(4096),
            ..Default::default()
        };
        let updated = update_instance_attributes(&pool, &update, Utc::now())
            .await?
            .expect("instance exists");

        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.memory_allocated, 4096);
        assert_eq!(updated.cpu_cores, created.cpu_cores);
        assert_eq!(updated.disk_size, created.disk_size);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.version, created.version + 1);

        let missing = UpdateInstanceRequest {
            id: created.id + 1,
            ..update
        };
        assert_eq!(update_instance_attributes(&pool, &missing, Utc::now()).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_attributes_checks_expected_version() -> MonodashResult<()> {
        let (_dir, pool) = test_pool().await?;
        let created = insert_instance(&pool, &request(100), 1, Utc::now()).await?;

        let update = UpdateInstanceRequest {
            id: created.id,
            cpu_cores: Some(4),
            version: Some(created.version),
            ..Default::default()
        };
        let updated = update_instance_attributes(&pool, &update, Utc::now())
            .await?
            .expect("row is at the expected version");
        assert_eq!(updated.cpu_cores, 4);
        assert_eq!(updated.version, 1);

        // Replaying the same edit now targets a stale version
        assert_eq!(update_instance_attributes(&pool, &update, Utc::now()).await?, None);
        let current = get_instance_by_id(&pool, created.id)
            .await?
            .expect("instance exists");
        assert_eq!(current.version, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_usage_row_is_rejected() -> MonodashResult<()> {
        let (_dir, pool) = test_pool().await?;
        insert_instance(&pool, &request(100), 1, Utc::now()).await?;
        sqlx::query("UPDATE instances SET status = 'running', cpu_usage = 5.0 WHERE handle = 100")
            .execute(&pool)
            .await?;

        let err = get_instance_by_handle(&pool, 100).await.unwrap_err();
        assert!(matches!(err, MonodashError::CorruptRecord(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_count_instances() -> MonodashResult<()> {
        let (_dir, pool) = test_pool().await?;
        insert_instance(&pool, &request(1), 1, Utc::now()).await?;
        insert_instance(&pool, &request(2), 1, Utc::now()).await?;
        let container = CreateInstanceRequest {
            kind: InstanceKind::Container,
            ..request(3)
        };
        insert_instance(&pool, &container, 1, Utc::now()).await?;

        let mut counts = count_instances(&pool).await?;
        counts.sort_by_key(|(kind, _, _)| kind.as_str());
        assert_eq!(
            counts,
            vec![
                (InstanceKind::Container, InstanceStatus::Stopped, 1),
                (InstanceKind::VirtualMachine, InstanceStatus::Stopped, 2),
            ]
        );
        Ok(())
    }
}
