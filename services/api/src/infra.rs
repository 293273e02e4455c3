use deal_or_disaster::config::AppConfig;
use deal_or_disaster::error::AppError;
use deal_or_disaster::game::{
    CaseCatalog, GameService, InMemoryChallengeRepository, InMemorySessionRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type HostedGameService = GameService<InMemorySessionRepository, InMemoryChallengeRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Embedded cases unless a JSON file is given.
pub(crate) fn load_catalog(path: Option<&Path>) -> Result<CaseCatalog, AppError> {
    let catalog = match path {
        Some(path) => {
            info!(path = %path.display(), "loading case catalog");
            CaseCatalog::from_path(path)?
        }
        None => CaseCatalog::builtin()?,
    };
    Ok(catalog)
}

pub(crate) fn build_game_service(config: &AppConfig) -> Result<Arc<HostedGameService>, AppError> {
    let catalog = Arc::new(load_catalog(config.game.cases_path.as_deref())?);
    let sessions = Arc::new(InMemorySessionRepository::default());
    let challenges = Arc::new(InMemoryChallengeRepository::new(catalog.clone()));
    info!(cases = catalog.len(), "case catalog ready");

    Ok(Arc::new(GameService::new(
        catalog,
        sessions,
        challenges,
        config.game_settings(),
    )))
}
