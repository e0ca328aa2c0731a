//! The service facade.
//!
//! [`Monodash`] owns the store and the telemetry capabilities and exposes each dashboard
//! operation as one async call. The HTTP server and the command-line interface are thin layers
//! over it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use typed_builder::TypedBuilder;

use crate::{
    config::{MonodashConfig, TelemetryConfig, TelemetrySourceKind, DEFAULT_SIMULATED_HOSTNAME},
    dashboard, lifecycle,
    lifecycle::TransitionPolicy,
    management,
    models::{
        validate_handle, ActionRequest, CreateInstanceRequest, DashboardOverview, HostTelemetry,
        Instance, InstanceStatus, MetricSample, MetricsQuery, NewMetricSample,
        UpdateInstanceRequest,
    },
    telemetry::{IoSampler, SimulatedTelemetry, SystemTelemetry, TelemetrySource, ZeroIo},
    MonodashError, MonodashResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The dashboard service.
#[derive(Clone, TypedBuilder, Getters)]
pub struct Monodash {
    /// The SQLite connection pool.
    #[getset(get = "pub with_prefix")]
    pool: Pool<Sqlite>,

    /// Produces host snapshots on refresh.
    telemetry: Arc<dyn TelemetrySource>,

    /// Produces disk and network rates for metric samples.
    #[builder(default = Arc::new(ZeroIo) as Arc<dyn IoSampler>)]
    io: Arc<dyn IoSampler>,

    /// How actions that do not apply are treated.
    #[builder(default)]
    #[getset(get = "pub with_prefix")]
    policy: TransitionPolicy,
}

/// Result of a health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"ok"`.
    pub status: String,

    /// When the check ran.
    pub timestamp: DateTime<Utc>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Monodash {
    /// Opens the database and builds the telemetry source described by `config`.
    pub async fn from_config(config: &MonodashConfig) -> MonodashResult<Self> {
        let db_path = config.db_path();
        let pool = management::get_or_create_db_pool(
            &db_path,
            *config.get_database().get_max_connections(),
        )
        .await?;

        let telemetry = telemetry_source(config.get_telemetry())?;
        let policy = config.get_lifecycle().policy();
        tracing::info!(db = %db_path.display(), ?policy, "monodash service ready");

        Ok(Self::builder()
            .pool(pool)
            .telemetry(telemetry)
            .policy(policy)
            .build())
    }

    /// Checks that the store answers.
    pub async fn health(&self) -> MonodashResult<HealthStatus> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(HealthStatus {
            status: "ok".to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Returns the dashboard read model.
    pub async fn dashboard_overview(&self) -> MonodashResult<DashboardOverview> {
        dashboard::dashboard_overview(&self.pool).await
    }

    /// Returns the latest host snapshot.
    pub async fn host_telemetry(&self) -> MonodashResult<HostTelemetry> {
        management::latest_host_telemetry(&self.pool)
            .await?
            .ok_or(MonodashError::NoTelemetryAvailable)
    }

    /// Takes a new sample from the telemetry source and stores it.
    pub async fn refresh_host_telemetry(&self) -> MonodashResult<HostTelemetry> {
        let sample = self.telemetry.sample()?;
        sample.validate()?;

        let snapshot = management::insert_host_telemetry(&self.pool, &sample, Utc::now()).await?;
        tracing::debug!(
            hostname = %snapshot.hostname,
            cpu_usage = snapshot.cpu_usage,
            memory_usage = snapshot.memory_usage,
            "recorded host telemetry"
        );

        Ok(snapshot)
    }

    /// Returns all instances, newest created first.
    pub async fn list_instances(&self) -> MonodashResult<Vec<Instance>> {
        management::list_instances(&self.pool).await
    }

    /// Returns the instance with the given handle.
    pub async fn get_instance(&self, handle: i64) -> MonodashResult<Instance> {
        validate_handle(handle)?;
        management::get_instance_by_handle(&self.pool, handle)
            .await?
            .ok_or_else(|| MonodashError::NotFound(format!("instance with handle {}", handle)))
    }

    /// Creates a stopped instance.
    pub async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> MonodashResult<Instance> {
        let cpu_cores = request.validate()?;
        let instance =
            management::insert_instance(&self.pool, request, cpu_cores, Utc::now()).await?;

        tracing::info!(
            handle = instance.handle,
            kind = %instance.kind,
            name = %instance.name,
            "created instance"
        );

        Ok(instance)
    }

    /// Changes the attributes of an instance. The last-modified time moves even when no
    /// attribute is given.
    pub async fn update_instance(
        &self,
        request: &UpdateInstanceRequest,
    ) -> MonodashResult<Instance> {
        request.validate()?;
        if request.is_empty() {
            tracing::debug!(
                id = request.id,
                "update without attributes only touches the instance"
            );
        }

        let Some(instance) =
            management::update_instance_attributes(&self.pool, request, Utc::now()).await?
        else {
            return Err(match management::get_instance_by_id(&self.pool, request.id).await? {
                Some(current) => {
                    tracing::warn!(
                        handle = current.handle,
                        expected = ?request.version,
                        actual = current.version,
                        "stale attribute update"
                    );
                    MonodashError::ConcurrentModification(current.handle)
                }
                None => MonodashError::NotFound(format!("instance with id {}", request.id)),
            });
        };

        tracing::info!(handle = instance.handle, "updated instance");
        Ok(instance)
    }

    /// Applies a lifecycle action.
    pub async fn perform_action(&self, request: &ActionRequest) -> MonodashResult<Instance> {
        lifecycle::perform_action(&self.pool, request, self.policy).await
    }

    /// Records the current usage of a running instance as a metric sample.
    pub async fn record_metric_sample(&self, handle: i64) -> MonodashResult<MetricSample> {
        let instance = self.get_instance(handle).await?;
        if instance.status != InstanceStatus::Running {
            return Err(MonodashError::NotRunning {
                handle,
                status: instance.status,
            });
        }

        let usage = instance.usage.ok_or_else(|| {
            MonodashError::CorruptRecord(format!("running instance {} has no usage", handle))
        })?;

        let sample = NewMetricSample {
            handle,
            cpu_usage: usage.cpu_usage,
            memory_usage: usage.memory_usage,
            memory_used: usage.memory_used,
            io: self.io.sample(&instance),
        };

        let stored = management::insert_metric_sample(&self.pool, &sample, Utc::now()).await?;
        tracing::debug!(handle, id = stored.id, "recorded metric sample");
        Ok(stored)
    }

    /// Returns the samples of an instance within the lookback window, newest first.
    pub async fn query_metric_samples(
        &self,
        query: &MetricsQuery,
    ) -> MonodashResult<Vec<MetricSample>> {
        let hours = query.validate()?;
        let since = Utc::now() - Duration::hours(hours);
        management::metric_samples_since(&self.pool, query.handle, since).await
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Builds the telemetry source selected in `config`.
pub fn telemetry_source(config: &TelemetryConfig) -> MonodashResult<Arc<dyn TelemetrySource>> {
    let source: Arc<dyn TelemetrySource> = match config.get_source() {
        TelemetrySourceKind::Simulated => Arc::new(SimulatedTelemetry::new(
            config
                .get_hostname()
                .clone()
                .unwrap_or_else(|| DEFAULT_SIMULATED_HOSTNAME.to_string()),
            *config.get_total_memory(),
            *config.get_seed(),
        )?),
        TelemetrySourceKind::System => {
            Arc::new(SystemTelemetry::new(config.get_hostname().clone()))
        }
    };

    Ok(source)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
