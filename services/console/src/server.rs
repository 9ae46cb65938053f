use crate::cli::SandboxArgs;
use crate::infra::AppState;
use crate::routes::with_sandbox_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use recruitment_pipeline::config::PipelineConfig;
use recruitment_pipeline::error::AppError;
use recruitment_pipeline::telemetry;
use recruitment_pipeline::workflows::recruitment::sandbox::{
    applications_from_path, demo_applications, InMemoryPipelineRepository, SandboxService,
    API_PREFIX,
};
use recruitment_pipeline::workflows::recruitment::ScoreThresholds;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: SandboxArgs) -> Result<(), AppError> {
    let mut config = PipelineConfig::load()?;

    if let Some(host) = args.host.take() {
        config.sandbox.host = host;
    }
    if let Some(port) = args.port.take() {
        config.sandbox.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let seed = match args.seed.as_deref() {
        Some(path) => applications_from_path(path)?,
        None => demo_applications(),
    };
    let service = Arc::new(SandboxService::new(
        Arc::new(InMemoryPipelineRepository::new()),
        ScoreThresholds::default(),
    ));
    let seeded = service.seed(seed)?;

    let app = with_sandbox_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.sandbox.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, api = API_PREFIX, seeded, "recruitment sandbox ready");

    axum::serve(listener, app).await?;
    Ok(())
}
