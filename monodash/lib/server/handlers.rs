//! HTTP request handlers for the REST API.
//!
//! Each handler unpacks its request, calls one operation on the service and serializes the
//! result. Extractor rejections are turned into the same JSON error shape as service errors.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::{
    data::{ApiError, MetricsParams},
    state::ServerState,
};
use crate::{
    models::{
        ActionRequest, CreateInstanceRequest, DashboardOverview, HostTelemetry, Instance,
        MetricSample, MetricsQuery, UpdateInstanceRequest,
    },
    service::HealthStatus,
};

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

type ApiResult<T> = Result<Json<T>, ApiError>;

type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

//-------------------------------------------------------------------------------------------------
// Functions: Handlers
//-------------------------------------------------------------------------------------------------

/// Handler for the GET /health endpoint
pub async fn health_handler(State(state): State<ServerState>) -> ApiResult<HealthStatus> {
    Ok(Json(state.service().health().await?))
}

/// Handler for the GET /dashboard endpoint
pub async fn dashboard_handler(State(state): State<ServerState>) -> ApiResult<DashboardOverview> {
    Ok(Json(state.service().dashboard_overview().await?))
}

/// Handler for the GET /host endpoint
pub async fn host_handler(State(state): State<ServerState>) -> ApiResult<HostTelemetry> {
    Ok(Json(state.service().host_telemetry().await?))
}

/// Handler for the POST /host/refresh endpoint
pub async fn refresh_host_handler(State(state): State<ServerState>) -> Created<HostTelemetry> {
    let snapshot = state.service().refresh_host_telemetry().await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Handler for the GET /instances endpoint
pub async fn list_instances_handler(State(state): State<ServerState>) -> ApiResult<Vec<Instance>> {
    Ok(Json(state.service().list_instances().await?))
}

/// Handler for the POST /instances endpoint
pub async fn create_instance_handler(
    State(state): State<ServerState>,
    payload: Result<Json<CreateInstanceRequest>, JsonRejection>,
) -> Created<Instance> {
    let Json(request) = payload?;
    let instance = state.service().create_instance(&request).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Handler for the POST /instances/update endpoint
pub async fn update_instance_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UpdateInstanceRequest>, JsonRejection>,
) -> ApiResult<Instance> {
    let Json(request) = payload?;
    Ok(Json(state.service().update_instance(&request).await?))
}

/// Handler for the GET /instances/{handle} endpoint
pub async fn get_instance_handler(
    State(state): State<ServerState>,
    handle: Result<Path<i64>, PathRejection>,
) -> ApiResult<Instance> {
    let Path(handle) = handle?;
    Ok(Json(state.service().get_instance(handle).await?))
}

/// Handler for the POST /actions endpoint
pub async fn action_handler(
    State(state): State<ServerState>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> ApiResult<Instance> {
    let Json(request) = payload?;
    Ok(Json(state.service().perform_action(&request).await?))
}

/// Handler for the POST /instances/{handle}/metrics endpoint
pub async fn record_metrics_handler(
    State(state): State<ServerState>,
    handle: Result<Path<i64>, PathRejection>,
) -> Created<MetricSample> {
    let Path(handle) = handle?;
    let sample = state.service().record_metric_sample(handle).await?;
    Ok((StatusCode::CREATED, Json(sample)))
}

/// Handler for the GET /instances/{handle}/metrics endpoint
pub async fn query_metrics_handler(
    State(state): State<ServerState>,
    handle: Result<Path<i64>, PathRejection>,
    params: Result<Query<MetricsParams>, QueryRejection>,
) -> ApiResult<Vec<MetricSample>> {
    let Path(handle) = handle?;
    let Query(params) = params?;
    let query = MetricsQuery {
        handle,
        hours: params.hours,
    };
    Ok(Json(state.service().query_metric_samples(&query).await?))
}
