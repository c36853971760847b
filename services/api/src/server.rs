use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAuditSink, InMemoryDocumentRequestRepository, InMemoryResidentRepository,
    InMemoryUploadStore,
};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use barangay_portal::config::AppConfig;
use barangay_portal::error::AppError;
use barangay_portal::portal::requests::DocumentRequestService;
use barangay_portal::portal::residents::ResidentDirectory;
use barangay_portal::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let audit = Arc::new(InMemoryAuditSink::default());
    let requests = Arc::new(DocumentRequestService::new(
        Arc::new(InMemoryDocumentRequestRepository::default()),
        audit.clone(),
        &config.portal.public_base_url,
    ));
    let residents = Arc::new(ResidentDirectory::new(
        Arc::new(InMemoryResidentRepository::default()),
        audit.clone(),
    ));
    let uploads = Arc::new(InMemoryUploadStore::default());

    let app = with_portal_routes(requests, residents, audit, uploads)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "barangay portal api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
