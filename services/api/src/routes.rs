use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use barangay_portal::portal::audit::{summarize, ActorContext, AuditAction, AuditSink};
use barangay_portal::portal::requests::{
    document_router, DocumentRequestRepository, DocumentRequestService, RepositoryError,
};
use barangay_portal::portal::residents::{
    DirectoryError, ResidentDirectory, ResidentRepository, ResidentRole,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::infra::{AppState, InMemoryUploadStore};

const AUDIT_DEFAULT_LIMIT: usize = 100;
const AUDIT_SCAN_LIMIT: usize = 1000;

pub(crate) fn with_portal_routes<R, D, A>(
    requests: Arc<DocumentRequestService<R, A>>,
    residents: Arc<ResidentDirectory<D, A>>,
    audit: Arc<A>,
    uploads: Arc<InMemoryUploadStore>,
) -> Router
where
    R: DocumentRequestRepository + 'static,
    D: ResidentRepository + 'static,
    A: AuditSink + 'static,
{
    document_router(requests)
        .merge(audit_router(audit))
        .merge(resident_router(residents))
        .merge(upload_router(uploads))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

fn audit_router<A: AuditSink + 'static>(audit: Arc<A>) -> Router {
    Router::new()
        .route("/api/admin/audit", get(audit_list_endpoint::<A>))
        .route("/api/admin/audit/stats", get(audit_stats_endpoint::<A>))
        .route("/api/admin/audit/log", post(audit_log_endpoint::<A>))
        .route(
            "/api/audit/log-pdf-download",
            post(log_pdf_download_endpoint::<A>),
        )
        .with_state(audit)
}

fn resident_router<D, A>(directory: Arc<ResidentDirectory<D, A>>) -> Router
where
    D: ResidentRepository + 'static,
    A: AuditSink + 'static,
{
    Router::new()
        .route("/api/user/set-verified", patch(set_verified_endpoint::<D, A>))
        .route("/api/user/set-role", patch(set_role_endpoint::<D, A>))
        .with_state(directory)
}

fn upload_router(uploads: Arc<InMemoryUploadStore>) -> Router {
    Router::new()
        .route("/api/upload", post(upload_endpoint))
        .with_state(uploads)
}

/// Identity and client metadata the middleware tier forwards as headers.
fn actor_from_headers(headers: &HeaderMap) -> ActorContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    ActorContext {
        user_id: header("x-user-id"),
        ip_address: header("x-forwarded-for"),
        user_agent: header("user-agent"),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuditListQuery {
    limit: Option<usize>,
}

pub(crate) async fn audit_list_endpoint<A: AuditSink>(
    State(audit): State<Arc<A>>,
    Query(query): Query<AuditListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(AUDIT_DEFAULT_LIMIT);
    match audit.recent(limit) {
        Ok(logs) => (
            StatusCode::OK,
            Json(json!({ "success": true, "logs": logs })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": err.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn audit_stats_endpoint<A: AuditSink>(State(audit): State<Arc<A>>) -> Response {
    match audit.recent(AUDIT_SCAN_LIMIT) {
        Ok(entries) => {
            let stats = summarize(&entries, Utc::now());
            (
                StatusCode::OK,
                Json(json!({ "success": true, "stats": stats })),
            )
                .into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": err.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuditLogBody {
    action: String,
    details: String,
}

/// Fire-and-forget append: clients never see sink failures, they only get
/// logged server-side.
pub(crate) async fn audit_log_endpoint<A: AuditSink>(
    State(audit): State<Arc<A>>,
    headers: HeaderMap,
    Json(body): Json<AuditLogBody>,
) -> Response {
    let actor = actor_from_headers(&headers);
    let entry = actor.entry(AuditAction::parse(&body.action), body.details);
    if let Err(err) = audit.append(entry) {
        warn!(error = %err, "audit append failed; continuing");
    }
    (StatusCode::ACCEPTED, Json(json!({ "success": true }))).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogPdfDownloadBody {
    #[serde(rename = "documentId", alias = "requestId")]
    document_id: String,
    #[serde(rename = "documentType")]
    document_type: Option<String>,
    #[serde(rename = "fileName")]
    file_name: Option<String>,
}

pub(crate) async fn log_pdf_download_endpoint<A: AuditSink>(
    State(audit): State<Arc<A>>,
    headers: HeaderMap,
    Json(body): Json<LogPdfDownloadBody>,
) -> Response {
    let actor = actor_from_headers(&headers);
    let subject = body
        .document_type
        .as_deref()
        .unwrap_or("document")
        .to_string();
    let mut details = format!("Viewed issued {subject} for request {}", body.document_id);
    if let Some(file_name) = &body.file_name {
        details.push_str(&format!(" ({file_name})"));
    }
    if let Err(err) = audit.append(actor.entry(AuditAction::PdfDownload, details)) {
        warn!(error = %err, "audit append failed; continuing");
    }
    (StatusCode::ACCEPTED, Json(json!({ "success": true }))).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdQuery {
    id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetVerifiedBody {
    verified: bool,
}

pub(crate) async fn set_verified_endpoint<D, A>(
    State(directory): State<Arc<ResidentDirectory<D, A>>>,
    Query(query): Query<IdQuery>,
    headers: HeaderMap,
    Json(body): Json<SetVerifiedBody>,
) -> Response
where
    D: ResidentRepository + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_from_headers(&headers);
    match directory.set_verified(&actor, &query.id, body.verified) {
        Ok(resident) => (
            StatusCode::OK,
            Json(json!({ "success": true, "role": resident.role })),
        )
            .into_response(),
        Err(err) => directory_failure(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetRoleBody {
    role: ResidentRole,
}

pub(crate) async fn set_role_endpoint<D, A>(
    State(directory): State<Arc<ResidentDirectory<D, A>>>,
    Query(query): Query<IdQuery>,
    headers: HeaderMap,
    Json(body): Json<SetRoleBody>,
) -> Response
where
    D: ResidentRepository + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_from_headers(&headers);
    match directory.set_role(&actor, &query.id, body.role) {
        Ok(resident) => (
            StatusCode::OK,
            Json(json!({ "success": true, "role": resident.role })),
        )
            .into_response(),
        Err(err) => directory_failure(err),
    }
}

fn directory_failure(err: DirectoryError) -> Response {
    let status = match &err {
        DirectoryError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DirectoryError::Repository(RepositoryError::Conflict) | DirectoryError::EmailTaken(_) => {
            StatusCode::CONFLICT
        }
        DirectoryError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        DirectoryError::InvalidRoleChange { .. }
        | DirectoryError::UnknownRole(_)
        | DirectoryError::ConfirmationMismatch => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadQuery {
    filename: String,
}

pub(crate) async fn upload_endpoint(
    State(uploads): State<Arc<InMemoryUploadStore>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Response {
    let url = uploads.store(&query.filename, body.to_vec());
    (StatusCode::CREATED, Json(json!({ "url": url }))).into_response()
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
