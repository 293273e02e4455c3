use crate::cli::ServeArgs;
use crate::infra::{build_game_service, AppState};
use crate::routes::with_game_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use deal_or_disaster::config::AppConfig;
use deal_or_disaster::error::AppError;
use deal_or_disaster::telemetry;
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

    let game_service = build_game_service(&config)?;

    let app = with_game_routes(game_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        timer_seconds = config.game.timer_seconds,
        "deal or disaster game server ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
