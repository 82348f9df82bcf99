use actix_web::http::StatusCode;
use actix_web::test;
use cah_backend::chain::GameStatus;
use serde_json::{json, Value};

use crate::common::{assert_problem, read_ok_json};
use crate::support::{create_test_app, TestWorld};

fn get_uri(game_id: u64, me: Option<&str>) -> String {
    match me {
        Some(me) => format!("/api/state/get?gameId={game_id}&me={me}"),
        None => format!("/api/state/get?gameId={game_id}"),
    }
}

fn put(body: Value) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/state/put")
        .set_json(body)
        .to_request()
}

#[actix_web::test]
async fn get_returns_public_state_and_own_hand() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(3);
    let app = create_test_app(world.state.clone())
        .with_prod_routes()
        .build()
        .await;

    let req = test::TestRequest::get()
        .uri(&get_uri(game_id, Some(players[1].as_str())))
        .to_request();
    let body = read_ok_json(test::call_service(&app, req).await).await;

    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], 2);
    assert_eq!(body["players"].as_array().unwrap().len(), 3);
    assert_eq!(body["address"], players[1].as_str());
    assert_eq!(body["state"]["phase"], "prestart");
    assert!(body["state"]["prestartUntil"].is_i64());
    assert!(body["state"].get("hands").is_none());
    assert!(body["state"].get("answersDeck").is_none());
    assert_eq!(body["hand"].as_array().unwrap().len(), 7);
    assert_eq!(body["timerConfig"]["submitSecs"], 45);
    assert!(body["serverTime"].is_i64());
}

#[actix_web::test]
async fn get_without_identity_omits_hand() {
    let world = TestWorld::new().await;
    let (game_id, _) = world.started_game(3);
    world.chain.set_status(game_id, GameStatus::Lobby);
    let app = create_test_app(world.state.clone())
        .with_prod_routes()
        .build()
        .await;

    let req = test::TestRequest::get().uri(&get_uri(game_id, None)).to_request();
    let body = read_ok_json(test::call_service(&app, req).await).await;

    assert_eq!(body["status"], 1);
    assert!(body["state"].is_null());
    assert!(body.get("hand").is_none());
    assert!(body["address"].is_null());
}

#[actix_web::test]
async fn get_validates_its_query() {
    let world = TestWorld::new().await;
    let app = create_test_app(world.state.clone())
        .with_prod_routes()
        .build()
        .await;

    let req = test::TestRequest::get().uri("/api/state/get").to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_GAME_ID",
        Some("Missing gameId"),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/state/get?gameId=-4")
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_GAME_ID",
        None,
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/state/get?gameId=5&me=alice")
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_PLAYER",
        None,
    )
    .await;
}

#[actix_web::test]
async fn put_submits_and_returns_the_full_record() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(3);
    let app = create_test_app(world.state.clone())
        .with_prod_routes()
        .build()
        .await;

    let req = test::TestRequest::get().uri(&get_uri(game_id, None)).to_request();
    read_ok_json(test::call_service(&app, req).await).await;
    world.clock.advance_secs(10);

    let card = world.stored(game_id).await.unwrap().hand(&players[1])[0];
    let req = put(json!({
        "gameId": game_id.to_string(),
        "from": players[1].as_str().to_uppercase().replacen("0X", "0x", 1),
        "action": "submit",
        "payload": { "answerId": card },
    }));
    let body = read_ok_json(test::call_service(&app, req).await).await;

    assert_eq!(body["ok"], true);
    assert_eq!(body["state"]["phase"], "submit");
    assert_eq!(body["state"]["submissions"][players[1].as_str()], card);
    assert!(body["state"]["hands"].is_object());
    assert!(body["state"]["answersDeck"].is_array());
}

#[actix_web::test]
async fn put_maps_rejections_to_problem_responses() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(3);
    let app = create_test_app(world.state.clone())
        .with_prod_routes()
        .build()
        .await;
    let outsider = format!("0x{}", "5".repeat(40));

    let req = test::TestRequest::post()
        .uri("/api/state/put")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"gameId\": 1,")
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "BAD_PAYLOAD",
        None,
    )
    .await;

    let req = put(json!({ "gameId": game_id, "from": players[1].as_str(), "action": "fold" }));
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_ACTION",
        Some("fold"),
    )
    .await;

    let req = put(json!({ "gameId": game_id, "from": players[1].as_str(), "action": "submit" }));
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "BAD_PAYLOAD",
        None,
    )
    .await;

    let req = put(json!({ "gameId": game_id, "from": outsider, "action": "nudge" }));
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::FORBIDDEN,
        "NOT_A_MEMBER",
        None,
    )
    .await;

    let req = put(json!({
        "gameId": game_id,
        "from": players[0].as_str(),
        "action": "judge_pick",
        "payload": { "winner": players[1].as_str() },
    }));
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "PHASE_MISMATCH",
        Some("phase=prestart"),
    )
    .await;

    world.chain.set_status(game_id, GameStatus::Cancelled);
    let req = put(json!({ "gameId": game_id, "from": players[1].as_str(), "action": "nudge" }));
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::CONFLICT,
        "GAME_NOT_ACTIVE",
        None,
    )
    .await;
}

#[actix_web::test]
async fn unreachable_upstream_is_retryable() {
    let world = TestWorld::new().await;
    let (game_id, _) = world.started_game(3);
    world.chain.set_roster_down(true);
    let app = create_test_app(world.state.clone())
        .with_prod_routes()
        .build()
        .await;

    let req = test::TestRequest::get().uri(&get_uri(game_id, None)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.headers().get("retry-after").and_then(|v| v.to_str().ok()),
        Some("1")
    );
    assert_problem(resp, StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE", None).await;
}
