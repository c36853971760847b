use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{DocumentType, FormPayload, PickupOption, RequestId, RequestSubmission};
use super::repository::{DocumentRequestRepository, RepositoryError};
use super::service::{DocumentRequestService, RequestServiceError, StatusUpdate};
use crate::portal::audit::domain::{ActorContext, AuditSink};

/// Router builder exposing the document request endpoints.
pub fn document_router<R, A>(service: Arc<DocumentRequestService<R, A>>) -> Router
where
    R: DocumentRequestRepository + 'static,
    A: AuditSink + 'static,
{
    Router::new()
        .route(
            "/api/document",
            post(submit_handler::<R, A>).get(list_handler::<R, A>),
        )
        .route("/api/user/docs", get(user_docs_handler::<R, A>))
        .route(
            "/api/document/set-status",
            patch(set_status_handler::<R, A>),
        )
        .route(
            "/api/document/:request_id/download",
            post(download_handler::<R, A>),
        )
        .route(
            "/api/admin/requests/stats",
            get(request_stats_handler::<R, A>),
        )
        .with_state(service)
}

/// Identity and client metadata the middleware tier forwards as headers.
pub(crate) fn actor_from_headers(headers: &HeaderMap) -> ActorContext {
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
pub(crate) struct SubmitRequestBody {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "type")]
    document_type: DocumentType,
    #[serde(rename = "pickupOption")]
    pickup_option: PickupOption,
    #[serde(flatten)]
    form: FormPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdQuery {
    id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserQuery {
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetStatusBody {
    status: String,
    #[serde(rename = "adminNotes")]
    admin_notes: Option<String>,
    #[serde(rename = "rejectionReason")]
    rejection_reason: Option<String>,
    #[serde(rename = "proofOfPayment")]
    proof_of_payment: Option<String>,
}

pub(crate) async fn submit_handler<R, A>(
    State(service): State<Arc<DocumentRequestService<R, A>>>,
    axum::Json(body): axum::Json<SubmitRequestBody>,
) -> Response
where
    R: DocumentRequestRepository + 'static,
    A: AuditSink + 'static,
{
    let submission = RequestSubmission {
        user_id: body.user_id,
        document_type: body.document_type,
        pickup_option: body.pickup_option,
        form: body.form,
    };

    match service.submit(submission, Utc::now()) {
        Ok(request) => (StatusCode::CREATED, axum::Json(request)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, A>(
    State(service): State<Arc<DocumentRequestService<R, A>>>,
) -> Response
where
    R: DocumentRequestRepository + 'static,
    A: AuditSink + 'static,
{
    match service.list_all() {
        Ok(requests) => (StatusCode::OK, axum::Json(requests)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn user_docs_handler<R, A>(
    State(service): State<Arc<DocumentRequestService<R, A>>>,
    Query(query): Query<UserQuery>,
) -> Response
where
    R: DocumentRequestRepository + 'static,
    A: AuditSink + 'static,
{
    match service.list_for_user(&query.user_id) {
        Ok(requests) => (StatusCode::OK, axum::Json(requests)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn set_status_handler<R, A>(
    State(service): State<Arc<DocumentRequestService<R, A>>>,
    Query(query): Query<IdQuery>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<SetStatusBody>,
) -> Response
where
    R: DocumentRequestRepository + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_from_headers(&headers);
    let status: super::domain::RequestStatus = body.status.into();
    let id = RequestId(query.id);

    // A resident attaching proof of payment arrives on the same endpoint as
    // admin moves; route it through the resident transition so the
    // approved-and-online precondition applies.
    if status == super::domain::RequestStatus::PaymentSent {
        if let Some(url) = body.proof_of_payment.clone() {
            return match service.submit_payment_proof(&id, url, Utc::now()) {
                Ok(request) => (
                    StatusCode::OK,
                    axum::Json(json!({ "success": true, "status": request.status })),
                )
                    .into_response(),
                Err(err) => failure_response(err),
            };
        }
    }

    let update = StatusUpdate {
        status,
        admin_notes: body.admin_notes,
        rejection_reason: body.rejection_reason,
        proof_of_payment: body.proof_of_payment,
    };

    match service.set_status(&actor, &id, update, Utc::now()) {
        Ok(request) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "status": request.status })),
        )
            .into_response(),
        Err(err) => failure_response(err),
    }
}

pub(crate) async fn download_handler<R, A>(
    State(service): State<Arc<DocumentRequestService<R, A>>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: DocumentRequestRepository + 'static,
    A: AuditSink + 'static,
{
    let actor = actor_from_headers(&headers);
    match service.download(&actor, &RequestId(request_id), Utc::now()) {
        Ok(issued) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "document": issued })),
        )
            .into_response(),
        Err(err) => failure_response(err),
    }
}

pub(crate) async fn request_stats_handler<R, A>(
    State(service): State<Arc<DocumentRequestService<R, A>>>,
) -> Response
where
    R: DocumentRequestRepository + 'static,
    A: AuditSink + 'static,
{
    match service.stats() {
        Ok(stats) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "stats": stats })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn status_for(err: &RequestServiceError) -> StatusCode {
    match err {
        RequestServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RequestServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        RequestServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        RequestServiceError::Submission(_) | RequestServiceError::Transition(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn error_response(err: RequestServiceError) -> Response {
    (
        status_for(&err),
        axum::Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// `{success, error}` envelope used by the mutation endpoints.
fn failure_response(err: RequestServiceError) -> Response {
    (
        status_for(&err),
        axum::Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}
