//! The dashboard read model.

use sqlx::{Pool, Sqlite};

use crate::{
    management,
    models::{DashboardOverview, InstanceKind, InstanceStatus, InstanceSummary},
    MonodashError, MonodashResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// How many recently created instances the overview lists.
pub const RECENT_INSTANCES_LIMIT: u32 = 5;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Assembles the overview from the current store contents. Nothing is cached.
pub async fn dashboard_overview(pool: &Pool<Sqlite>) -> MonodashResult<DashboardOverview> {
    let host = management::latest_host_telemetry(pool)
        .await?
        .ok_or(MonodashError::NoTelemetryAvailable)?;

    let counts = management::count_instances(pool).await?;
    let recent_vms = management::recent_instances(pool, RECENT_INSTANCES_LIMIT).await?;

    Ok(DashboardOverview {
        host,
        vm_summary: summarize(&counts),
        recent_vms,
    })
}

/// Folds per (kind, status) counts into the summary shape.
///
/// Paused and suspended instances count toward the totals only.
pub fn summarize(counts: &[(InstanceKind, InstanceStatus, u32)]) -> InstanceSummary {
    counts
        .iter()
        .fold(InstanceSummary::default(), |mut summary, &(kind, status, n)| {
            let (total, running, stopped) = match kind {
                InstanceKind::VirtualMachine => (
                    &mut summary.total_vms,
                    &mut summary.running_vms,
                    &mut summary.stopped_vms,
                ),
                InstanceKind::Container => (
                    &mut summary.total_containers,
                    &mut summary.running_containers,
                    &mut summary.stopped_containers,
                ),
            };

            *total += n;
            match status {
                InstanceStatus::Running => *running += n,
                InstanceStatus::Stopped => *stopped += n,
                InstanceStatus::Paused | InstanceStatus::Suspended => {}
            }

            summary
        })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        management::{get_or_create_db_pool, insert_host_telemetry, insert_instance},
        models::{CreateInstanceRequest, HostTelemetrySample},
    };
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn host_sample() -> HostTelemetrySample {
        HostTelemetrySample {
            hostname: "pve".to_string(),
            uptime: 60,
            cpu_usage: 1.0,
            memory_usage: 10.0,
            total_memory: 1000,
            used_memory: 100,
            load_average: "0.00 0.00 0.00".to_string(),
        }
    }

    fn create_request(handle: i64, kind: InstanceKind) -> CreateInstanceRequest {
        CreateInstanceRequest {
            handle,
            name: format!("instance-{}", handle),
            kind,
            cpu_cores: None,
            memory_allocated: 1024,
            disk_size: 10,
        }
    }

    #[test]
    fn test_summarize_counts_paused_in_totals_only() {
        let summary = summarize(&[
            (InstanceKind::VirtualMachine, InstanceStatus::Running, 2),
            (InstanceKind::VirtualMachine, InstanceStatus::Paused, 1),
            (InstanceKind::VirtualMachine, InstanceStatus::Stopped, 3),
            (InstanceKind::Container, InstanceStatus::Suspended, 4),
            (InstanceKind::Container, InstanceStatus::Running, 1),
        ]);

        assert_eq!(
            summary,
            InstanceSummary {
                total_vms: 6,
                running_vms: 2,
                stopped_vms: 3,
                total_containers: 5,
                running_containers: 1,
                stopped_containers: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_overview_requires_telemetry() -> MonodashResult<()> {
        let temp_dir = tempdir()?;
        let pool = get_or_create_db_pool(temp_dir.path().join("test.db"), 1).await?;

        let err = dashboard_overview(&pool).await.unwrap_err();
        assert!(matches!(err, MonodashError::NoTelemetryAvailable));
        Ok(())
    }

    #[tokio::test]
    async fn test_overview_with_no_instances() -> MonodashResult<()> {
        let temp_dir = tempdir()?;
        let pool = get_or_create_db_pool(temp_dir.path().join("test.db"), 1).await?;
        insert_host_telemetry(&pool, &host_sample(), Utc::now()).await?;

        let overview = dashboard_overview(&pool).await?;
        assert_eq!(overview.vm_summary, InstanceSummary::default());
        assert!(overview.recent_vms.is_empty());
        assert_eq!(overview.host.hostname, "pve");
        Ok(())
    }

    #[tokio::test]
    async fn test_overview_lists_five_newest() -> MonodashResult<()> {
        let temp_dir = tempdir()?;
        let pool = get_or_create_db_pool(temp_dir.path().join("test.db"), 1).await?;
        insert_host_telemetry(&pool, &host_sample(), Utc::now()).await?;

        let base = Utc::now() - Duration::hours(1);
        for handle in 1..=7 {
            let kind = if handle % 2 == 0 {
                InstanceKind::Container
            } else {
                InstanceKind::VirtualMachine
            };
            let created_at = base + Duration::minutes(handle);
            insert_instance(&pool, &create_request(handle, kind), 1, created_at).await?;
        }

        let overview = dashboard_overview(&pool).await?;
        let handles: Vec<i64> = overview.recent_vms.iter().map(|i| i.handle).collect();
        assert_eq!(handles, vec![7, 6, 5, 4, 3]);
        assert_eq!(overview.vm_summary.total_vms, 4);
        assert_eq!(overview.vm_summary.stopped_vms, 4);
        assert_eq!(overview.vm_summary.total_containers, 3);
        assert_eq!(overview.vm_summary.running_containers, 0);
        Ok(())
    }
}
