//! Room, invite and message API integration tests

use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use justjio::shared::Envelope;

use crate::assert_api_error;
use crate::common::{create_test_user, seat_room, spawn_app, TestDatabase};

#[tokio::test]
#[serial]
async fn test_create_room_and_accept_invite() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();
    let bob = create_test_user(db.pool(), "bob", "password123").await.unwrap();

    let response = app
        .server
        .post("/v1/rooms")
        .authorization_bearer(&alice.token)
        .json(&json!({
            "room": {
                "name": "Picnic",
                "date": "2026-11-01T00:00:00Z",
                "time": "noon",
                "venue": "East Coast"
            },
            "inviteesId": [bob.id]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    let room_id = body["room"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["room"]["hostId"], alice.id);
    assert_eq!(body["invites"].as_array().unwrap().len(), 1);

    let response = app
        .server
        .get("/v1/rooms/invites/count")
        .authorization_bearer(&bob.token)
        .await;
    assert_eq!(response.json::<serde_json::Value>()["count"], 1);

    // Not yet an attendee
    let response = app
        .server
        .get(&format!("/v1/rooms/{}", room_id))
        .authorization_bearer(&bob.token)
        .await;
    assert_api_error!(response, StatusCode::FORBIDDEN);

    let response = app
        .server
        .patch(&format!("/v1/rooms/{}", room_id))
        .authorization_bearer(&bob.token)
        .json(&json!({ "accept": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["room"]["attendeesCount"], 2);
    assert_eq!(body["attendees"].as_array().unwrap().len(), 2);

    let response = app
        .server
        .get(&format!("/v1/rooms/{}", room_id))
        .authorization_bearer(&bob.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_guard_distinguishes_missing_room() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();

    let missing = justjio::shared::ids::new_time_ordered_id();
    let response = app
        .server
        .get(&format!("/v1/rooms/{}/attendees", missing))
        .authorization_bearer(&alice.token)
        .await;
    assert_api_error!(response, StatusCode::NOT_FOUND);

    let response = app
        .server
        .get("/v1/rooms/not-an-id/attendees")
        .authorization_bearer(&alice.token)
        .await;
    assert_api_error!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_only_host_can_close() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();
    let bob = create_test_user(db.pool(), "bob", "password123").await.unwrap();
    let room_id = seat_room(&app, &alice, &[&bob]).await;

    let response = app
        .server
        .patch(&format!("/v1/rooms/{}/close", room_id))
        .authorization_bearer(&bob.token)
        .await;
    assert_api_error!(response, StatusCode::FORBIDDEN);

    let response = app
        .server
        .patch(&format!("/v1/rooms/{}/close", room_id))
        .authorization_bearer(&alice.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .server
        .get(&format!("/v1/rooms/{}", room_id))
        .authorization_bearer(&alice.token)
        .await;
    assert_eq!(response.json::<serde_json::Value>()["isClosed"], true);
}

#[tokio::test]
#[serial]
async fn test_message_is_published_to_every_attendee() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();
    let bob = create_test_user(db.pool(), "bob", "password123").await.unwrap();
    let carol = create_test_user(db.pool(), "carol", "password123").await.unwrap();
    let room_id = seat_room(&app, &alice, &[&bob]).await;
    for user in [&alice, &bob, &carol] {
        app.state.publisher.ensure_user_topic(user.id).await.unwrap();
    }

    let response = app
        .server
        .post(&format!("/v1/rooms/{}/messages", room_id))
        .authorization_bearer(&bob.token)
        .json(&json!({ "content": "hello" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let names = app.state.publisher.names();
    assert_eq!(app.broker.message_count(&names.user_topic(alice.id)).await, 1);
    assert_eq!(app.broker.message_count(&names.user_topic(bob.id)).await, 1);
    assert_eq!(app.broker.message_count(&names.user_topic(carol.id)).await, 0);

    let mut consumer = app
        .broker
        .subscribe(&names.user_topic(alice.id), "test")
        .await
        .unwrap();
    let payload = consumer
        .poll(std::time::Duration::from_secs(1))
        .await
        .unwrap()
        .expect("one envelope");
    let envelope = Envelope::from_slice(&payload).unwrap();
    let data = envelope.chat_data().unwrap();
    assert_eq!(data.room_id, room_id);
    assert_eq!(data.sender_id, bob.id.to_string());
    assert_eq!(data.sender_name, "bob");
    assert_eq!(data.content, "hello");

    let response = app
        .server
        .get(&format!("/v1/rooms/{}/messages", room_id))
        .authorization_bearer(&alice.token)
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["pageCount"], 1);
}

#[tokio::test]
#[serial]
async fn test_empty_message_is_rejected() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();
    let room_id = seat_room(&app, &alice, &[]).await;

    let response = app
        .server
        .post(&format!("/v1/rooms/{}/messages", room_id))
        .authorization_bearer(&alice.token)
        .json(&json!({ "content": "   " }))
        .await;

    assert_api_error!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_close_and_leave_wait_for_consolidation() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();
    let bob = create_test_user(db.pool(), "bob", "password123").await.unwrap();
    let carol = create_test_user(db.pool(), "carol", "password123").await.unwrap();
    let room_id = seat_room(&app, &alice, &[&bob, &carol]).await;
    let leave = format!("/v1/rooms/{}/leave", room_id);
    let close = format!("/v1/rooms/{}/close", room_id);

    // No bills at all counts as consolidated
    let response = app.server.patch(&leave).authorization_bearer(&carol.token).await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());

    let response = app.server.patch(&leave).authorization_bearer(&alice.token).await;
    assert_api_error!(response, StatusCode::CONFLICT);

    let response = app
        .server
        .post("/v1/bills")
        .authorization_bearer(&alice.token)
        .json(&json!({ "roomId": room_id, "name": "Groceries", "amount": 20.0, "payers": [bob.id] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());

    let response = app.server.patch(&leave).authorization_bearer(&bob.token).await;
    assert_api_error!(response, StatusCode::CONFLICT);
    let response = app.server.patch(&close).authorization_bearer(&alice.token).await;
    assert_api_error!(response, StatusCode::CONFLICT);

    let response = app
        .server
        .post("/v1/bills/consolidate")
        .authorization_bearer(&alice.token)
        .json(&json!({ "roomId": room_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());

    let response = app.server.patch(&leave).authorization_bearer(&bob.token).await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let response = app.server.patch(&close).authorization_bearer(&alice.token).await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());

    // The host still cannot leave a closed room
    let response = app.server.patch(&leave).authorization_bearer(&alice.token).await;
    assert_api_error!(response, StatusCode::CONFLICT);
}
