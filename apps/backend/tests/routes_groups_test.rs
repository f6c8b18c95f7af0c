//! HTTP surface for groups, end to end over the in-memory store.

mod common;

use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::unique_name;
use common::test_app;
use serde_json::{json, Value};
use signup_backend::domain::GroupView;
use signup_backend::routes::groups::CreatedGroup;
use signup_backend::{build_state, MemoryGroupStore};

fn create_body() -> Value {
    json!({
        "location": "Community Gym",
        "description": "",
        "date": "2099-06-12",
        "start_time": "19:30",
        "end_time": "21:30",
        "retreat_deadline": "2099-06-12T12:00",
        "single_limit": 1,
        "double_limit": "4",
        "pin": "organizer"
    })
}

async fn memory_state() -> signup_backend::AppState {
    build_state()
        .with_store(std::sync::Arc::new(MemoryGroupStore::new()))
        .build()
        .await
        .unwrap()
}

#[actix_web::test]
async fn create_join_and_view_a_session() {
    let app = test_app(memory_state().await).await;

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .set_json(create_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers().get(LOCATION).unwrap().to_str().unwrap().to_string();
    let created: CreatedGroup = test::read_body_json(resp).await;
    assert_eq!(location, format!("/api/groups/{}", created.id));

    for name in ["Ann", "Ben"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/groups/{}/players/single", created.id))
            .set_json(json!({"name": name, "pin": "1234"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    let req = test::TestRequest::get().uri(&location).to_request();
    let view: GroupView = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view.id, created.id);
    assert_eq!(view.description, None);
    assert_eq!(view.date, "Fri,Jun 12");
    assert_eq!(view.single_players.len(), 1);
    assert_eq!(view.single_players[0].name, "Ann");
    assert_eq!(view.single_waitlist[0].name, "Ben");

    let req = test::TestRequest::get().uri("/api/groups").to_request();
    let listed: Vec<GroupView> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);
}

#[actix_web::test]
async fn group_views_never_expose_pins() {
    let app = test_app(memory_state().await).await;

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .set_json(create_body())
        .to_request();
    let created: CreatedGroup = test::call_and_read_body_json(&app, req).await;

    let pin = unique_name("secret");
    let req = test::TestRequest::post()
        .uri(&format!("/api/groups/{}/players/double", created.id))
        .set_json(json!({"name": "Ann", "pin": pin}))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/groups/{}", created.id))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("Ann"));
    assert!(!text.contains(&pin));
    assert!(!text.contains("organizer"));
}

#[actix_web::test]
async fn invalid_creation_names_the_field() {
    let app = test_app(memory_state().await).await;

    let mut body = create_body();
    body["single_limit"] = json!("-1");
    let req = test::TestRequest::post()
        .uri("/api/groups")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details_from_service_response(
        resp,
        "VALIDATION_ERROR",
        StatusCode::BAD_REQUEST,
        Some("single_limit"),
    )
    .await;
}

#[actix_web::test]
async fn unknown_group_is_a_404_problem() {
    let app = test_app(memory_state().await).await;

    let req = test::TestRequest::get().uri("/api/groups/42").to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details_from_service_response(
        resp,
        "GROUP_NOT_FOUND",
        StatusCode::NOT_FOUND,
        Some("Can't find group with ID 42"),
    )
    .await;
}

#[actix_web::test]
async fn malformed_path_segments_are_bad_requests() {
    let app = test_app(memory_state().await).await;

    let req = test::TestRequest::get().uri("/api/groups/abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_GROUP_ID",
        StatusCode::BAD_REQUEST,
        None,
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/groups/1/players/triple")
        .set_json(json!({"name": "Ann", "pin": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_QUEUE_TYPE",
        StatusCode::BAD_REQUEST,
        Some("triple"),
    )
    .await;
}

#[actix_web::test]
async fn duplicate_and_wrong_pin_map_to_409_and_403() {
    let app = test_app(memory_state().await).await;

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .set_json(create_body())
        .to_request();
    let created: CreatedGroup = test::call_and_read_body_json(&app, req).await;
    let players = format!("/api/groups/{}/players/double", created.id);

    let req = test::TestRequest::post()
        .uri(&players)
        .set_json(json!({"name": "Ann", "pin": "1"}))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&players)
        .set_json(json!({"name": "ANN", "pin": "2"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "DUPLICATE_NAME",
        StatusCode::CONFLICT,
        Some("Player with the same name already exists"),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri(&players)
        .set_json(json!({"name": "Ann", "pin": "2"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "WRONG_PIN",
        StatusCode::FORBIDDEN,
        Some("Wrong PIN"),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri(&players)
        .set_json(json!({"name": "Zed", "pin": "2"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "PLAYER_NOT_FOUND",
        StatusCode::NOT_FOUND,
        Some("Can't find player with that name"),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri(&players)
        .set_json(json!({"name": "ann", "pin": "organizer"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn bad_json_and_bad_query_are_problems_too() {
    let app = test_app(memory_state().await).await;

    let req = test::TestRequest::post()
        .uri("/api/groups/1/players/single")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"name\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "BAD_REQUEST",
        StatusCode::BAD_REQUEST,
        Some("Invalid JSON"),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/groups?limit=lots")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "BAD_REQUEST",
        StatusCode::BAD_REQUEST,
        Some("Invalid query string"),
    )
    .await;
}

#[actix_web::test]
async fn store_failures_are_server_errors() {
    let store = MemoryGroupStore::new();
    let state = build_state()
        .with_store(std::sync::Arc::new(store.clone()))
        .build()
        .await
        .unwrap();
    let app = test_app(state).await;

    store.set_fail_writes(true);
    let req = test::TestRequest::post()
        .uri("/api/groups")
        .set_json(create_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "DB_ERROR",
        StatusCode::INTERNAL_SERVER_ERROR,
        None,
    )
    .await;
}
