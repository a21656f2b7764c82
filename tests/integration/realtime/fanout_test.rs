//! Gateway fan-out integration tests
//!
//! The API publisher and the gateway registry share one in-process broker,
//! so an envelope travels the same path it takes in production minus the
//! network hops.

use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio::time::timeout;

use justjio::backend::broker::{Broker, MemoryBroker, Publisher, TopicNames};
use justjio::backend::realtime::registry::SOCKET_BUFFER;
use justjio::backend::realtime::ConnectionRegistry;
use justjio::shared::config::Environment;
use justjio::shared::{ChatMessageData, Envelope};

use crate::common::wait_for;

const USER: i64 = 7;

fn wire() -> (ConnectionRegistry, Publisher, MemoryBroker, TopicNames) {
    let memory = MemoryBroker::new();
    let names = TopicNames::new("justjio", Environment::Dev);
    let registry = ConnectionRegistry::spawn(Broker::Memory(memory.clone()), names.clone());
    let publisher = Publisher::new(Broker::Memory(memory.clone()), names.clone());
    (registry, publisher, memory, names)
}

fn chat(content: &str) -> Envelope {
    let data = ChatMessageData::new("room-1", 3, "bob", content, chrono::Utc::now());
    Envelope::chat_message(&data).unwrap()
}

async fn next_text(rx: &mut mpsc::Receiver<Message>) -> String {
    match timeout(Duration::from_secs(3), rx.recv()).await {
        Ok(Some(Message::Text(text))) => text.as_str().to_string(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_every_socket_of_a_user_receives_the_envelope() {
    let (registry, publisher, _memory, _names) = wire();
    publisher.ensure_user_topic(USER).await.unwrap();

    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, mut rx_b) = mpsc::channel(8);
    let first = registry.attach(USER, tx_a).await.unwrap();
    let second = registry.attach(USER, tx_b).await.unwrap();
    assert!(first.is_initializing_user);
    assert!(!second.is_initializing_user);

    let envelope = chat("hello");
    publisher.send_to_user(USER, &envelope).await.unwrap();

    let expected = String::from_utf8(envelope.to_bytes().unwrap()).unwrap();
    assert_eq!(next_text(&mut rx_a).await, expected);
    assert_eq!(next_text(&mut rx_b).await, expected);

    registry.shutdown().await;
}

#[tokio::test]
async fn test_envelopes_arrive_in_publish_order() {
    let (registry, publisher, _memory, _names) = wire();
    publisher.ensure_user_topic(USER).await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    registry.attach(USER, tx).await.unwrap();

    for content in ["one", "two", "three"] {
        publisher.send_to_user(USER, &chat(content)).await.unwrap();
    }

    for content in ["one", "two", "three"] {
        let envelope = Envelope::from_slice(next_text(&mut rx).await.as_bytes()).unwrap();
        assert_eq!(envelope.chat_data().unwrap().content, content);
    }

    registry.shutdown().await;
}

#[tokio::test]
async fn test_other_users_do_not_see_the_envelope() {
    let (registry, publisher, _memory, _names) = wire();
    publisher.ensure_user_topic(USER).await.unwrap();
    publisher.ensure_user_topic(USER + 1).await.unwrap();

    let (tx_mine, mut rx_mine) = mpsc::channel(8);
    let (tx_other, mut rx_other) = mpsc::channel(8);
    registry.attach(USER, tx_mine).await.unwrap();
    registry.attach(USER + 1, tx_other).await.unwrap();

    publisher.send_to_user(USER, &chat("private")).await.unwrap();

    next_text(&mut rx_mine).await;
    assert!(
        timeout(Duration::from_millis(300), rx_other.recv()).await.is_err(),
        "another user's socket received the envelope"
    );

    registry.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_resumes_after_last_consumed_envelope() {
    let (registry, publisher, memory, names) = wire();
    publisher.ensure_user_topic(USER).await.unwrap();
    let topic = names.user_topic(USER);

    let (tx, mut rx) = mpsc::channel(8);
    let attached = registry.attach(USER, tx).await.unwrap();
    publisher.send_to_user(USER, &chat("before")).await.unwrap();
    next_text(&mut rx).await;

    assert!(registry.detach(USER, attached.conn_id).await);
    wait_for(|| {
        let memory = memory.clone();
        let topic = topic.clone();
        async move { memory.consumer_count(&topic) == 0 }
    })
    .await;

    // Published while nobody is connected, kept by the broker
    publisher.send_to_user(USER, &chat("offline")).await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let attached = registry.attach(USER, tx).await.unwrap();
    assert!(attached.is_initializing_user);

    let envelope = Envelope::from_slice(next_text(&mut rx).await.as_bytes()).unwrap();
    assert_eq!(envelope.chat_data().unwrap().content, "offline");

    registry.shutdown().await;
}

#[tokio::test]
async fn test_backlog_larger_than_socket_buffer_is_delivered_in_full() {
    const BACKLOG: usize = SOCKET_BUFFER * 3;
    let (registry, publisher, _memory, _names) = wire();
    publisher.ensure_user_topic(USER).await.unwrap();

    // Retained while the user is offline, replayed on attach
    for i in 0..BACKLOG {
        let envelope = Envelope::notification("Backlog", &i.to_string()).unwrap();
        publisher.send_to_user(USER, &envelope).await.unwrap();
    }

    let (tx, mut rx) = mpsc::channel(SOCKET_BUFFER);
    registry.attach(USER, tx).await.unwrap();

    // A slow reader: the consumer has to wait for the queue instead of dropping
    for i in 0..BACKLOG {
        let envelope = Envelope::from_slice(next_text(&mut rx).await.as_bytes()).unwrap();
        assert_eq!(envelope.notification_data().unwrap().content, i.to_string());
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(
        timeout(Duration::from_millis(200), rx.recv()).await.is_err(),
        "more frames than were published"
    );

    registry.shutdown().await;
}
