//! Instance lifecycle state machine.
//!
//! | Current           | Action | Next    | Usage                                          |
//! |-------------------|--------|---------|------------------------------------------------|
//! | stopped           | start  | running | 5% CPU, 25% memory, a quarter of RAM, uptime 0 |
//! | running / paused  | stop   | stopped | cleared                                        |
//! | running           | reboot | running | same as start                                  |
//! | running           | pause  | paused  | CPU 0%, memory kept                            |
//! | paused            | resume | running | CPU 5%, memory kept                            |
//!
//! Any other pair is not covered. Under [`TransitionPolicy::Lenient`] it leaves status and usage
//! untouched but the instance is still written, so its last-modified time moves. Under
//! [`TransitionPolicy::Strict`] it fails with `InvalidTransition` and nothing is written.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::{
    management,
    models::{
        validate_handle, ActionRequest, Instance, InstanceStatus, LifecycleAction, UsageSnapshot,
        BOOT_CPU_USAGE, PAUSED_CPU_USAGE,
    },
    MonodashError, MonodashResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How uncovered (status, action) pairs are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Uncovered pairs are a no-op.
    #[default]
    Lenient,

    /// Uncovered pairs are rejected.
    Strict,
}

/// The outcome of applying an action to a status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// The status after the action.
    pub status: InstanceStatus,

    /// The usage after the action.
    pub usage: Option<UsageSnapshot>,

    /// Whether the pair is covered by the state machine.
    pub applied: bool,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Computes the next status and usage of an instance.
pub fn transition(
    status: InstanceStatus,
    usage: Option<UsageSnapshot>,
    memory_allocated: i64,
    action: LifecycleAction,
) -> Transition {
    use InstanceStatus::*;
    use LifecycleAction::*;

    let (status, usage) = match (status, action) {
        (Stopped, Start) | (Running, Reboot) => {
            (Running, Some(UsageSnapshot::booted(memory_allocated)))
        }
        (Running, Stop) | (Paused, Stop) => (Stopped, None),
        (Running, Pause) => (
            Paused,
            usage.map(|u| UsageSnapshot {
                cpu_usage: PAUSED_CPU_USAGE,
                ..u
            }),
        ),
        (Paused, Resume) => (
            Running,
            usage.map(|u| UsageSnapshot {
                cpu_usage: BOOT_CPU_USAGE,
                ..u
            }),
        ),
        _ => {
            return Transition {
                status,
                usage,
                applied: false,
            }
        }
    };

    Transition {
        status,
        usage,
        applied: true,
    }
}

/// Applies a lifecycle action to the instance with the given handle and persists the result.
///
/// The write only succeeds if the row has not changed since it was read; otherwise the call fails
/// with `ConcurrentModification` and the caller decides whether to retry.
pub async fn perform_action(
    pool: &Pool<Sqlite>,
    request: &ActionRequest,
    policy: TransitionPolicy,
) -> MonodashResult<Instance> {
    validate_handle(request.handle)?;

    let Some(current) = management::get_instance_by_handle(pool, request.handle).await? else {
        return Err(MonodashError::NotFound(format!(
            "instance with handle {}",
            request.handle
        )));
    };

    let next = transition(
        current.status,
        current.usage,
        current.memory_allocated,
        request.action,
    );

    if !next.applied {
        if policy == TransitionPolicy::Strict {
            return Err(MonodashError::InvalidTransition {
                handle: current.handle,
                status: current.status,
                action: request.action,
            });
        }

        tracing::debug!(
            handle = current.handle,
            status = %current.status,
            action = %request.action,
            "action does not apply to current status, leaving instance unchanged"
        );
    }

    let updated = Instance {
        status: next.status,
        usage: next.usage,
        ..current
    };

    let Some(saved) = management::save_instance_state(pool, &updated, Utc::now()).await? else {
        tracing::warn!(handle = request.handle, "lost update race on instance");
        return Err(MonodashError::ConcurrentModification(request.handle));
    };

    tracing::info!(
        handle = saved.handle,
        action = %request.action,
        status = %saved.status,
        "applied lifecycle action"
    );

    Ok(saved)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        management::{get_or_create_db_pool, insert_instance, DEFAULT_MAX_CONNECTIONS},
        models::{CreateInstanceRequest, InstanceKind},
    };
    use tempfile::{tempdir, TempDir};

    const ALL_STATUSES: [InstanceStatus; 4] = [
        InstanceStatus::Running,
        InstanceStatus::Stopped,
        InstanceStatus::Paused,
        InstanceStatus::Suspended,
    ];

    const ALL_ACTIONS: [LifecycleAction; 5] = [
        LifecycleAction::Start,
        LifecycleAction::Stop,
        LifecycleAction::Reboot,
        LifecycleAction::Pause,
        LifecycleAction::Resume,
    ];

    fn running_usage() -> UsageSnapshot {
        UsageSnapshot {
            cpu_usage: 73.5,
            memory_usage: 61.25,
            memory_used: 1254,
            uptime: 86_400,
        }
    }

    fn usage_for(status: InstanceStatus) -> Option<UsageSnapshot> {
        match status {
            InstanceStatus::Stopped => None,
            _ => Some(running_usage()),
        }
    }

    async fn pool_with_instance(handle: i64) -> MonodashResult<(TempDir, Pool<Sqlite>)> {
        let temp_dir = tempdir()?;
        let pool =
            get_or_create_db_pool(temp_dir.path().join("test.db"), DEFAULT_MAX_CONNECTIONS)
                .await?;
        let request = CreateInstanceRequest {
            handle,
            name: "web-01".to_string(),
            kind: InstanceKind::VirtualMachine,
            cpu_cores: Some(2),
            memory_allocated: 2048,
            disk_size: 20,
        };
        insert_instance(&pool, &request, 2, Utc::now()).await?;
        Ok((temp_dir, pool))
    }

    #[test]
    fn test_start_boots_a_stopped_instance() {
        let next = transition(InstanceStatus::Stopped, None, 2048, LifecycleAction::Start);
        assert!(next.applied);
        assert_eq!(next.status, InstanceStatus::Running);
        assert_eq!(next.usage, Some(UsageSnapshot::booted(2048)));
        assert_eq!(next.usage.map(|u| u.memory_used), Some(512));
    }

    #[test]
    fn test_stop_clears_usage() {
        for status in [InstanceStatus::Running, InstanceStatus::Paused] {
            let next = transition(status, Some(running_usage()), 2048, LifecycleAction::Stop);
            assert!(next.applied);
            assert_eq!(next.status, InstanceStatus::Stopped);
            assert_eq!(next.usage, None);
        }
    }

    #[test]
    fn test_reboot_resets_usage() {
        let next = transition(
            InstanceStatus::Running,
            Some(running_usage()),
            4096,
            LifecycleAction::Reboot,
        );
        assert_eq!(next.status, InstanceStatus::Running);
        assert_eq!(next.usage, Some(UsageSnapshot::booted(4096)));
    }

    #[test]
    fn test_pause_keeps_memory() {
        let next = transition(
            InstanceStatus::Running,
            Some(running_usage()),
            2048,
            LifecycleAction::Pause,
        );
        let usage = next.usage.expect("paused instances keep usage");
        assert_eq!(next.status, InstanceStatus::Paused);
        assert_eq!(usage.cpu_usage, 0.0);
        assert_eq!(usage.memory_usage, running_usage().memory_usage);
        assert_eq!(usage.memory_used, running_usage().memory_used);
        assert_eq!(usage.uptime, running_usage().uptime);
    }

    #[test]
    fn test_resume_restores_cpu_and_keeps_memory() {
        let paused = UsageSnapshot {
            cpu_usage: 0.0,
            ..running_usage()
        };
        let next = transition(InstanceStatus::Paused, Some(paused), 2048, LifecycleAction::Resume);
        let usage = next.usage.expect("running instances have usage");
        assert_eq!(next.status, InstanceStatus::Running);
        assert_eq!(usage.cpu_usage, 5.0);
        assert_eq!(usage.memory_usage, paused.memory_usage);
        assert_eq!(usage.memory_used, paused.memory_used);
    }

    #[test]
    fn test_uncovered_pairs_change_nothing() {
        let covered = [
            (InstanceStatus::Stopped, LifecycleAction::Start),
            (InstanceStatus::Running, LifecycleAction::Stop),
            (InstanceStatus::Paused, LifecycleAction::Stop),
            (InstanceStatus::Running, LifecycleAction::Reboot),
            (InstanceStatus::Running, LifecycleAction::Pause),
            (InstanceStatus::Paused, LifecycleAction::Resume),
        ];

        for status in ALL_STATUSES {
            for action in ALL_ACTIONS {
                let usage = usage_for(status);
                let next = transition(status, usage, 2048, action);
                assert_eq!(next.applied, covered.contains(&(status, action)));
                if !next.applied {
                    assert_eq!(next.status, status, "{} on {}", action, status);
                    assert_eq!(next.usage, usage, "{} on {}", action, status);
                }
            }
        }
    }

    #[test]
    fn test_stopped_iff_usage_absent_after_every_transition() {
        for status in ALL_STATUSES {
            for action in ALL_ACTIONS {
                let next = transition(status, usage_for(status), 2048, action);
                assert_eq!(
                    next.status == InstanceStatus::Stopped,
                    next.usage.is_none(),
                    "{} on {}",
                    action,
                    status
                );
            }
        }
    }

    #[tokio::test]
    async fn test_perform_action_persists_and_bumps_version() -> MonodashResult<()> {
        let (_dir, pool) = pool_with_instance(100).await?;

        let request = ActionRequest {
            handle: 100,
            action: LifecycleAction::Start,
        };
        let started = perform_action(&pool, &request, TransitionPolicy::Lenient).await?;
        assert_eq!(started.status, InstanceStatus::Running);
        assert_eq!(started.version, 1);

        let stored = management::get_instance_by_handle(&pool, 100).await?;
        assert_eq!(stored, Some(started));
        Ok(())
    }

    #[tokio::test]
    async fn test_lenient_noop_still_touches_instance() -> MonodashResult<()> {
        let (_dir, pool) = pool_with_instance(100).await?;
        let before = management::get_instance_by_handle(&pool, 100)
            .await?
            .expect("instance exists");

        let request = ActionRequest {
            handle: 100,
            action: LifecycleAction::Stop,
        };
        let after = perform_action(&pool, &request, TransitionPolicy::Lenient).await?;

        assert_eq!(after.status, InstanceStatus::Stopped);
        assert_eq!(after.usage, None);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.version, before.version + 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_uncovered_pair() -> MonodashResult<()> {
        let (_dir, pool) = pool_with_instance(100).await?;

        let request = ActionRequest {
            handle: 100,
            action: LifecycleAction::Resume,
        };
        let err = perform_action(&pool, &request, TransitionPolicy::Strict)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MonodashError::InvalidTransition {
                handle: 100,
                status: InstanceStatus::Stopped,
                action: LifecycleAction::Resume,
            }
        ));

        // Nothing was written
        let stored = management::get_instance_by_handle(&pool, 100)
            .await?
            .expect("instance exists");
        assert_eq!(stored.version, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_handle_is_not_found() -> MonodashResult<()> {
        let (_dir, pool) = pool_with_instance(100).await?;

        let request = ActionRequest {
            handle: 999,
            action: LifecycleAction::Start,
        };
        let err = perform_action(&pool, &request, TransitionPolicy::Lenient)
            .await
            .unwrap_err();
        assert!(matches!(err, MonodashError::NotFound(_)));
        assert!(err.to_string().contains("999"));
        Ok(())
    }
}
