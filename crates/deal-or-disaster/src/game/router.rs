use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::challenge::ChallengeId;
use super::evaluator::Decision;
use super::flags::{FlagAnswer, FlagClick};
use super::persistence::{ChallengeRepository, RepositoryError, SessionRepository, SessionSnapshot};
use super::score::GameScore;
use super::service::{GameService, GameServiceError, ModeRequest};
use super::session::{CaseCompletion, GameError, GameId};

#[derive(Debug, Deserialize)]
pub struct StartGameRequest {
    pub user_id: String,
    #[serde(default)]
    pub mode: ModeRequest,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub choice: usize,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
}

#[derive(Debug, Deserialize)]
pub struct SaveSessionRequest {
    pub game_id: GameId,
    pub user_id: String,
    pub score: GameScore,
}

#[derive(Debug, Deserialize)]
pub struct CompleteChallengeRequest {
    pub user_id: String,
    pub decision: Decision,
    pub points_earned: i32,
    pub time_taken: u32,
}

/// Router builder exposing gameplay and score persistence endpoints.
pub fn game_router<S, C>(service: Arc<GameService<S, C>>) -> Router
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    Router::new()
        .route("/api/v1/games", post(start_handler::<S, C>))
        .route("/api/v1/games/:game_id", get(game_handler::<S, C>))
        .route(
            "/api/v1/games/:game_id/flags/:flag_id",
            post(click_handler::<S, C>),
        )
        .route(
            "/api/v1/games/:game_id/flags/:flag_id/answer",
            post(answer_handler::<S, C>),
        )
        .route(
            "/api/v1/games/:game_id/decision",
            post(decision_handler::<S, C>),
        )
        .route("/api/v1/games/:game_id/next", post(next_handler::<S, C>))
        .route("/api/v1/sessions", post(save_session_handler::<S, C>))
        .route("/api/v1/challenges/today", get(today_handler::<S, C>))
        .route(
            "/api/v1/challenges/:challenge_id/complete",
            post(complete_handler::<S, C>),
        )
        .route(
            "/api/v1/challenges/:challenge_id/completions",
            get(completions_handler::<S, C>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    axum::Json(request): axum::Json<StartGameRequest>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    match service.start_game(&request.user_id, request.mode) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn game_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    Path(game_id): Path<String>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    match service.game(&GameId(game_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn click_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    Path((game_id, flag_id)): Path<(String, String)>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    match service.click_flag(&GameId(game_id), &flag_id) {
        Ok(outcome @ FlagClick::UnknownFlag { .. }) => {
            (StatusCode::NOT_FOUND, axum::Json(outcome)).into_response()
        }
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn answer_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    Path((game_id, flag_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    match service.answer_flag(&GameId(game_id), &flag_id, request.choice) {
        Ok(outcome @ FlagAnswer::UnknownFlag { .. }) => {
            (StatusCode::NOT_FOUND, axum::Json(outcome)).into_response()
        }
        Ok(outcome @ (FlagAnswer::InvalidChoice { .. } | FlagAnswer::NotAQuiz { .. })) => {
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(outcome)).into_response()
        }
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn decision_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    Path(game_id): Path<String>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    match service.decide(&GameId(game_id), request.decision) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn next_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    Path(game_id): Path<String>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    match service.next_case(&GameId(game_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn save_session_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    axum::Json(request): axum::Json<SaveSessionRequest>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    let snapshot = SessionSnapshot {
        game_id: request.game_id,
        user_id: request.user_id,
        score: request.score,
        recorded_at: Utc::now(),
    };
    let game_id = snapshot.game_id.clone();
    match service.save_session(snapshot) {
        Ok(()) => (
            StatusCode::CREATED,
            axum::Json(json!({ "game_id": game_id, "status": "saved" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn today_handler<S, C>(State(service): State<Arc<GameService<S, C>>>) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    match service.today_challenge() {
        Ok(challenge) => (StatusCode::OK, axum::Json(challenge)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn complete_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    Path(challenge_id): Path<String>,
    axum::Json(request): axum::Json<CompleteChallengeRequest>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    let completion = CaseCompletion {
        decision: request.decision,
        points_earned: request.points_earned,
        time_taken: request.time_taken,
    };
    match service.complete_challenge(&ChallengeId(challenge_id), &request.user_id, completion) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn completions_handler<S, C>(
    State(service): State<Arc<GameService<S, C>>>,
    Path(challenge_id): Path<String>,
) -> Response
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    match service.challenge_completions(&ChallengeId(challenge_id)) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: GameServiceError) -> Response {
    let status = match &err {
        GameServiceError::UnknownGame(_)
        | GameServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        GameServiceError::ChallengeAlreadyCompleted(_)
        | GameServiceError::Repository(RepositoryError::Conflict)
        | GameServiceError::Game(GameError::RoundInProgress) => StatusCode::CONFLICT,
        GameServiceError::MissingUser | GameServiceError::Game(GameError::NotRegularMode) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        GameServiceError::Game(_)
        | GameServiceError::Catalog(_)
        | GameServiceError::Repository(RepositoryError::Unavailable(_)) => {
            tracing::error!(error = %err, "game request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
