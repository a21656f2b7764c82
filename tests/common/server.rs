//! API test server
//!
//! Builds the real router around a test pool and an in-process broker, so
//! tests can inspect what the API published.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use sqlx::PgPool;

use justjio::backend::broker::{Broker, MemoryBroker};
use justjio::backend::routes::create_router;
use justjio::backend::server::AppState;

use super::auth_helpers::{test_config, TestUser};

pub struct TestApp {
    pub server: TestServer,
    pub broker: MemoryBroker,
    pub state: AppState,
}

/// Start the API against `pool`
pub fn spawn_app(pool: PgPool) -> TestApp {
    let broker = MemoryBroker::new();
    let state = AppState::new(test_config(), Some(pool), Broker::Memory(broker.clone()));
    let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");
    TestApp { server, broker, state }
}

/// Start the API without a database
pub fn spawn_app_without_db() -> TestApp {
    let broker = MemoryBroker::new();
    let state = AppState::new(test_config(), None, Broker::Memory(broker.clone()));
    let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");
    TestApp { server, broker, state }
}

/// Create a room hosted by `host` and accept the invite of every guest
///
/// Returns the room id.
pub async fn seat_room(app: &TestApp, host: &TestUser, guests: &[&TestUser]) -> String {
    let invitees: Vec<i64> = guests.iter().map(|guest| guest.id).collect();
    let response = app
        .server
        .post("/v1/rooms")
        .authorization_bearer(&host.token)
        .json(&json!({
            "room": {
                "name": "Dinner",
                "date": "2026-11-01T00:00:00Z",
                "time": "7pm",
                "venue": "Maxwell"
            },
            "inviteesId": invitees,
            "message": "come"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let body: serde_json::Value = response.json();
    let room_id = body["room"]["id"].as_str().expect("room id").to_string();

    for guest in guests {
        let response = app
            .server
            .patch(&format!("/v1/rooms/{}", room_id))
            .authorization_bearer(&guest.token)
            .json(&json!({ "accept": true }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    }
    room_id
}
