//! Bill, consolidation and settlement API integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;

use justjio::shared::{Envelope, MessageType};

use crate::assert_api_error;
use crate::common::{create_test_user, seat_room, spawn_app, TestApp, TestDatabase, TestUser};

async fn post_bill(app: &TestApp, owner: &TestUser, room_id: &str, body: serde_json::Value) -> axum_test::TestResponse {
    let mut body = body;
    body["roomId"] = json!(room_id);
    app.server
        .post("/v1/bills")
        .authorization_bearer(&owner.token)
        .json(&body)
        .await
}

fn debts(result: &serde_json::Value) -> Vec<(i64, i64, f64)> {
    result["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tx| {
            (
                tx["payerId"].as_i64().unwrap(),
                tx["payeeId"].as_i64().unwrap(),
                tx["amount"].as_f64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
#[serial]
async fn test_consolidate_nets_bills_and_settles() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();
    let bob = create_test_user(db.pool(), "bob", "password123").await.unwrap();
    let carol = create_test_user(db.pool(), "carol", "password123").await.unwrap();
    let room_id = seat_room(&app, &alice, &[&bob, &carol]).await;
    app.state.publisher.ensure_user_topic(alice.id).await.unwrap();

    // Alice pays 30 for three, Bob pays 12 for Alice alone
    let response = post_bill(
        &app,
        &alice,
        &room_id,
        json!({ "name": "Dinner", "amount": 30.0, "payers": [bob.id, carol.id], "includeOwner": true }),
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let response = post_bill(
        &app,
        &bob,
        &room_id,
        json!({ "name": "Taxi", "amount": 12.0, "payers": [alice.id] }),
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());

    let response = app
        .server
        .get(&format!("/v1/bills/consolidate/{}", room_id))
        .authorization_bearer(&carol.token)
        .await;
    assert_eq!(response.json::<serde_json::Value>()["isConsolidated"], false);

    // Only the host consolidates
    let response = app
        .server
        .post("/v1/bills/consolidate")
        .authorization_bearer(&bob.token)
        .json(&json!({ "roomId": room_id }))
        .await;
    assert_api_error!(response, StatusCode::FORBIDDEN);

    let response = app
        .server
        .post("/v1/bills/consolidate")
        .authorization_bearer(&alice.token)
        .json(&json!({ "roomId": room_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let result: serde_json::Value = response.json();
    assert_eq!(result["billIds"].as_array().unwrap().len(), 2);
    assert_eq!(
        debts(&result),
        vec![(alice.id, bob.id, 2.0), (carol.id, alice.id, 10.0)]
    );

    let response = app
        .server
        .get(&format!("/v1/bills/consolidate/{}", room_id))
        .authorization_bearer(&carol.token)
        .await;
    assert_eq!(response.json::<serde_json::Value>()["isConsolidated"], true);

    // A consolidated room takes no new bills
    let response = post_bill(
        &app,
        &carol,
        &room_id,
        json!({ "name": "Dessert", "amount": 5.0, "payers": [alice.id] }),
    )
    .await;
    assert_api_error!(response, StatusCode::CONFLICT);

    let response = app
        .server
        .get("/v1/transactions")
        .authorization_bearer(&carol.token)
        .add_query_param("isPaid", false)
        .await;
    let open: serde_json::Value = response.json();
    let open = open.as_array().unwrap();
    assert_eq!(open.len(), 1);
    let tx_id = open[0]["id"].as_i64().unwrap();

    let response = app
        .server
        .patch(&format!("/v1/transactions/{}/settle", tx_id))
        .authorization_bearer(&alice.token)
        .await;
    assert_api_error!(response, StatusCode::FORBIDDEN);

    let response = app
        .server
        .patch(&format!("/v1/transactions/{}/settle", tx_id))
        .authorization_bearer(&carol.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let settled: serde_json::Value = response.json();
    assert_eq!(settled["isPaid"], true);
    assert!(settled["paidOn"].is_string());

    let response = app
        .server
        .patch(&format!("/v1/transactions/{}/settle", tx_id))
        .authorization_bearer(&carol.token)
        .await;
    assert_api_error!(response, StatusCode::CONFLICT);

    // The payee hears about it once, stored and published
    let topic = app.state.publisher.names().user_topic(alice.id);
    assert_eq!(app.broker.message_count(&topic).await, 1);
    let mut consumer = app.broker.subscribe(&topic, "test").await.unwrap();
    let payload = consumer
        .poll(std::time::Duration::from_secs(1))
        .await
        .unwrap()
        .expect("notification envelope");
    let envelope = Envelope::from_slice(&payload).unwrap();
    assert_eq!(envelope.msg_type, MessageType::Notification);
    let data = envelope.notification_data().unwrap();
    assert_eq!(data.title, "Transaction Settled");
    assert_eq!(data.content, "carol paid you $10.00!");

    let response = app
        .server
        .get("/v1/notifications")
        .authorization_bearer(&alice.token)
        .await;
    let stored: serde_json::Value = response.json();
    assert_eq!(stored.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_consolidate_without_bills_is_conflict() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();
    let room_id = seat_room(&app, &alice, &[]).await;

    let response = app
        .server
        .get(&format!("/v1/bills/consolidate/{}", room_id))
        .authorization_bearer(&alice.token)
        .await;
    assert_eq!(response.json::<serde_json::Value>()["isConsolidated"], true);

    let response = app
        .server
        .post("/v1/bills/consolidate")
        .authorization_bearer(&alice.token)
        .json(&json!({ "roomId": room_id }))
        .await;
    assert_api_error!(response, StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
async fn test_bill_validation() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();
    let bob = create_test_user(db.pool(), "bob", "password123").await.unwrap();
    let carol = create_test_user(db.pool(), "carol", "password123").await.unwrap();
    let room_id = seat_room(&app, &alice, &[&bob]).await;

    let response = post_bill(
        &app,
        &alice,
        &room_id,
        json!({ "name": "Dinner", "amount": 0.0, "payers": [bob.id] }),
    )
    .await;
    assert_api_error!(response, StatusCode::BAD_REQUEST);

    // Owner alone is not a payer
    let response = post_bill(
        &app,
        &alice,
        &room_id,
        json!({ "name": "Dinner", "amount": 10.0, "payers": [alice.id] }),
    )
    .await;
    assert_api_error!(response, StatusCode::BAD_REQUEST);

    // Carol exists but is not attending
    let response = post_bill(
        &app,
        &alice,
        &room_id,
        json!({ "name": "Dinner", "amount": 10.0, "payers": [carol.id] }),
    )
    .await;
    assert_api_error!(response, StatusCode::BAD_REQUEST);

    let response = post_bill(
        &app,
        &carol,
        &room_id,
        json!({ "name": "Dinner", "amount": 10.0, "payers": [alice.id] }),
    )
    .await;
    assert_api_error!(response, StatusCode::FORBIDDEN);

    let response = app
        .server
        .get("/v1/bills")
        .authorization_bearer(&bob.token)
        .add_query_param("roomId", &room_id)
        .await;
    assert_eq!(response.json::<serde_json::Value>().as_array().unwrap().len(), 0);
}
