//! Database migration tests
//!
//! Tests to ensure migrations run correctly and the schema enforces its
//! constraints.

use serial_test::serial;

use crate::common::{create_test_user, TestDatabase};

#[tokio::test]
#[serial]
async fn test_all_tables_exist() {
    let Some(db) = TestDatabase::try_new().await else { return };

    for table in [
        "users",
        "friendships",
        "friend_requests",
        "rooms",
        "room_users",
        "room_invites",
        "messages",
        "consolidations",
        "bills",
        "bill_payers",
        "transactions",
        "notifications",
        "subscriptions",
    ] {
        let result = sqlx::query(&format!("SELECT 1 FROM {} LIMIT 1", table))
            .execute(db.pool())
            .await;
        assert!(result.is_ok(), "{} table should exist", table);
    }
}

#[tokio::test]
#[serial]
async fn test_migrations_are_idempotent() {
    let Some(db) = TestDatabase::try_new().await else { return };

    let result = crate::common::run_migrations(db.pool()).await;
    assert!(result.is_ok(), "Running migrations twice should succeed");
}

#[tokio::test]
#[serial]
async fn test_self_friendship_is_rejected() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();

    let result = sqlx::query("INSERT INTO friendships (user_id, friend_id) VALUES ($1, $1)")
        .bind(alice.id)
        .execute(db.pool())
        .await;

    assert!(result.is_err(), "A user cannot befriend themselves");
}
