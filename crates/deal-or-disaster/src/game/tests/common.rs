use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::game::cases::{CaseCatalog, PropertyCase};
use crate::game::persistence::{
    InMemoryChallengeRepository, InMemorySessionRepository, RepositoryError, RetryPolicy,
    SessionRepository, SessionSnapshot,
};
use crate::game::service::{GameService, GameSettings};
use crate::game::views::GameView;
use crate::game::game_router;

pub(super) type MemoryService = GameService<InMemorySessionRepository, InMemoryChallengeRepository>;

pub(super) fn settings() -> GameSettings {
    GameSettings {
        timer_seconds: 300,
        retry: RetryPolicy {
            max_attempts: 2,
            backoff: Duration::ZERO,
        },
    }
}

pub(super) fn catalog() -> Arc<CaseCatalog> {
    Arc::new(CaseCatalog::builtin().expect("builtin catalog"))
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemorySessionRepository>,
    Arc<InMemoryChallengeRepository>,
) {
    let catalog = catalog();
    let sessions = Arc::new(InMemorySessionRepository::default());
    let challenges = Arc::new(InMemoryChallengeRepository::new(catalog.clone()));
    let service =
        GameService::new(catalog, sessions.clone(), challenges.clone(), settings()).with_seed(42);
    (service, sessions, challenges)
}

/// Canonical case behind a view, ground truth included.
pub(super) fn truth_for(service: &MemoryService, view: &GameView) -> PropertyCase {
    service
        .catalog()
        .get(&view.case.id)
        .expect("dealt case exists in catalog")
}

pub(super) struct UnavailableSessions;

impl SessionRepository for UnavailableSessions {
    fn save_snapshot(&self, _snapshot: SessionSnapshot) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn game_router_with_service(service: MemoryService) -> axum::Router {
    game_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
