use crate::cli::ServeArgs;
use crate::infra::{in_memory_engine, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bistro::config::AppConfig;
use bistro::error::AppError;
use bistro::reputation::InMemoryStore;
use bistro::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryStore::default());
    let engine = in_memory_engine(store, config.policy.clone());

    let app = with_operational_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        delivery_fee = %config.policy.checkout.standard_delivery_fee,
        vip_discount_rate = %config.policy.checkout.vip_discount_rate,
        "bistro reputation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
