use super::common::*;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::game::router::{game_handler, start_handler, StartGameRequest};
use crate::game::service::ModeRequest;

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn start_game_returns_created_with_hidden_ground_truth() {
    let (service, _, _) = build_service();
    let router = game_router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/games",
            json!({ "user_id": "player-1" }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["user_id"], "player-1");
    assert_eq!(body["time_remaining"], 300);
    assert_eq!(body["timer"], "running");
    assert!(body["case"].get("actual_value").is_none());
    assert!(body["case"].get("is_good_deal").is_none());
    for flag in body["case"]["red_flags"].as_array().expect("flags") {
        assert!(flag.get("description").is_none());
    }
}

#[tokio::test]
async fn unknown_game_returns_not_found() {
    let (service, _, _) = build_service();
    let router = game_router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/games/game-missing"))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("game-missing"));
}

#[tokio::test]
async fn decision_endpoint_scores_and_then_ignores_repeats() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let view = service
        .start_game("player-1", ModeRequest::Regular)
        .expect("game starts");
    let router = crate::game::game_router(service.clone());
    let uri = format!("/api/v1/games/{}/decision", view.game_id);

    let first = router
        .clone()
        .oneshot(json_request("POST", &uri, json!({ "decision": "INVESTIGATE" })))
        .await
        .expect("router response");
    assert_eq!(first.status(), StatusCode::OK);
    let first = read_json_body(first).await;
    assert_eq!(first["applied"], true);
    assert_eq!(first["resolution"]["result"]["points"], 10);
    assert_eq!(first["resolution"]["completion"]["decision"], "INVESTIGATE");

    let second = router
        .oneshot(json_request("POST", &uri, json!({ "decision": "BUY" })))
        .await
        .expect("router response");
    assert_eq!(second.status(), StatusCode::OK);
    let second = read_json_body(second).await;
    assert_eq!(second["applied"], false);
    assert_eq!(second["score"]["points"], 10);
}

#[tokio::test]
async fn unknown_decision_is_rejected() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let view = service
        .start_game("player-1", ModeRequest::Regular)
        .expect("game starts");
    let router = crate::game::game_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/games/{}/decision", view.game_id),
            json!({ "decision": "FLIP_IT" }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn out_of_range_quiz_choice_is_unprocessable() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let view = service
        .start_game("player-1", ModeRequest::Regular)
        .expect("game starts");
    let quiz_flag = view
        .case
        .red_flags
        .iter()
        .find(|flag| flag.has_quiz)
        .expect("every builtin case has a quiz flag")
        .id
        .clone();
    let router = crate::game::game_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/games/{}/flags/{quiz_flag}/answer", view.game_id),
            json!({ "choice": 99 }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"], "invalid_choice");
}

#[tokio::test]
async fn unknown_flag_returns_not_found() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let view = service
        .start_game("player-1", ModeRequest::Regular)
        .expect("game starts");
    let router = crate::game::game_router(service);

    let response = router
        .oneshot(empty_request(
            "POST",
            &format!("/api/v1/games/{}/flags/no-such-flag", view.game_id),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn challenge_completion_is_created_once() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let challenge = service.today_challenge().expect("challenge");
    let router = crate::game::game_router(service);
    let uri = format!("/api/v1/challenges/{}/complete", challenge.id);
    let payload = json!({
        "user_id": "player-1",
        "decision": "WALK_AWAY",
        "points_earned": 50,
        "time_taken": 120
    });

    let created = router
        .clone()
        .oneshot(json_request("POST", &uri, payload.clone()))
        .await
        .expect("router response");
    assert_eq!(created.status(), StatusCode::CREATED);

    let duplicate = router
        .clone()
        .oneshot(json_request("POST", &uri, payload))
        .await
        .expect("router response");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let listed = router
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/challenges/{}/completions", challenge.id),
        ))
        .await
        .expect("router response");
    assert_eq!(listed.status(), StatusCode::OK);
    let body = read_json_body(listed).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["time_taken"], 120);
}

#[tokio::test]
async fn completions_for_unknown_challenge_are_not_found() {
    let (service, _, _) = build_service();
    let router = game_router_with_service(service);

    let response = router
        .oneshot(empty_request(
            "GET",
            "/api/v1/challenges/daily-1999-01-01/completions",
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_endpoint_reports_storage_outage() {
    let catalog = catalog();
    let challenges = Arc::new(crate::game::InMemoryChallengeRepository::new(
        catalog.clone(),
    ));
    let service = crate::game::GameService::new(
        catalog,
        Arc::new(UnavailableSessions),
        challenges,
        settings(),
    );
    let router = crate::game::game_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/sessions",
            json!({
                "game_id": "game-000001",
                "user_id": "player-1",
                "score": crate::game::GameScore::default()
            }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn handlers_can_be_called_directly() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);

    let created = start_handler(
        State(service.clone()),
        axum::Json(StartGameRequest {
            user_id: "player-9".to_string(),
            mode: ModeRequest::Regular,
        }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json_body(created).await;
    let game_id = body["game_id"].as_str().expect("game id").to_string();

    let fetched = game_handler(State(service), Path(game_id.clone())).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let body = read_json_body(fetched).await;
    assert_eq!(body["game_id"], game_id);
}
