//! HTTP surface over [`ReconService`].

use crate::{
    error::ServiceError,
    extract::ResultRecord,
    job::{JobId, JobStatus, LogEntry},
    service::ReconService,
};
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

const START_ENDPOINT: &str = "/api/start";
const STATUS_ENDPOINT: &str = "/api/status/{job_id}";
const DETAILS_ENDPOINT: &str = "/api/details/{job_id}/{data_type}";
const REPORT_ENDPOINT: &str = "/api/report/{job_id}";
const JOBS_ENDPOINT: &str = "/api/jobs";
const HEALTH_ENDPOINT: &str = "/api/health";

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::InvalidRequest(_)
            | ServiceError::DomainRequired
            | ServiceError::InvalidDomain(_)
            | ServiceError::InvalidDataType(_) => StatusCode::BAD_REQUEST,
            ServiceError::JobNotFound(_)
            | ServiceError::DataNotAvailable
            | ServiceError::ReportNotFound => StatusCode::NOT_FOUND,
            ServiceError::ReadArtifact { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("request failed: {self}");
        }
        (
            status,
            Json(json!({
                "success": false,
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    #[serde(default)]
    domain: String,
}

#[derive(Debug, Serialize)]
struct StartResponse {
    success: bool,
    job_id: JobId,
    domain: String,
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    since: Option<u64>,
}

#[derive(Debug, Serialize)]
struct StatusResults {
    #[serde(flatten)]
    record: ResultRecord,
    job_id: JobId,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: JobStatus,
    phase: u8,
    logs: Vec<LogEntry>,
    cursor: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<StatusResults>,
}

#[derive(Debug, Serialize)]
struct DetailResponse {
    data: Vec<String>,
}

pub fn build_router(service: ReconService) -> Router {
    Router::new()
        .route(START_ENDPOINT, post(handle_start))
        .route(STATUS_ENDPOINT, get(handle_status))
        .route(DETAILS_ENDPOINT, get(handle_details))
        .route(REPORT_ENDPOINT, get(handle_report))
        .route(JOBS_ENDPOINT, get(handle_jobs))
        .route(HEALTH_ENDPOINT, get(handle_health))
        .with_state(service)
}

/// Binds `bind` and serves until Ctrl-C.
pub async fn serve(service: ReconService, bind: &str) -> Result<()> {
    let bind_addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address '{bind}': expected host:port"))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve listen address")?;
    info!("listening on http://{local_addr}");

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("server exited unexpectedly")?;
    Ok(())
}

async fn handle_start(
    State(service): State<ReconService>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<StartResponse>, ServiceError> {
    let Json(req) =
        payload.map_err(|rejection| ServiceError::InvalidRequest(rejection.body_text()))?;
    let submitted = service.submit(&req.domain)?;
    Ok(Json(StartResponse {
        success: true,
        job_id: submitted.job_id,
        domain: submitted.domain,
    }))
}

async fn handle_status(
    State(service): State<ReconService>,
    Path(job_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, ServiceError> {
    let job_id = JobId::new(job_id);
    let snapshot = service.poll(&job_id, query.since)?;
    Ok(Json(StatusResponse {
        status: snapshot.status,
        phase: snapshot.phase,
        logs: snapshot.logs,
        cursor: snapshot.cursor,
        results: snapshot
            .results
            .map(|record| StatusResults { record, job_id }),
    }))
}

async fn handle_details(
    State(service): State<ReconService>,
    Path((job_id, data_type)): Path<(String, String)>,
) -> Result<Json<DetailResponse>, ServiceError> {
    let data = service.detail(&JobId::new(job_id), &data_type).await?;
    Ok(Json(DetailResponse { data }))
}

async fn handle_report(
    State(service): State<ReconService>,
    Path(job_id): Path<String>,
) -> Result<Response, ServiceError> {
    let body = service.report(&JobId::new(job_id)).await?;
    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, "text/markdown; charset=utf-8")],
        body,
    )
        .into_response())
}

async fn handle_jobs(State(service): State<ReconService>) -> Response {
    Json(service.jobs()).into_response()
}

async fn handle_health(State(service): State<ReconService>) -> Response {
    let registry = service.registry();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "jobs": registry.len(),
            "running": registry.running(),
        })),
    )
        .into_response()
}
