//! Gateway socket tests
//!
//! Serves the gateway router on a loopback port and drives it with a real
//! WebSocket client, so the upgrade, the read loop and the registry all run
//! as they do in production.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, AUTHORIZATION, ORIGIN};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use justjio::backend::auth::sessions::create_token;
use justjio::backend::broker::{Broker, MemoryBroker, Publisher, TopicNames};
use justjio::backend::realtime::{create_router, GatewayState};
use justjio::shared::Envelope;

use crate::common::{generate_test_token, test_config, wait_for, TEST_ORIGIN};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const USER: i64 = 11;

struct TestGateway {
    addr: SocketAddr,
    state: GatewayState,
    memory: MemoryBroker,
    names: TopicNames,
}

impl TestGateway {
    async fn spawn() -> Self {
        let memory = MemoryBroker::new();
        let config = test_config();
        let names = TopicNames::from_config(&config);
        let state = GatewayState::new(config, Broker::Memory(memory.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            memory,
            names,
        }
    }

    async fn connect(&self, token: Option<&str>) -> Client {
        let mut request = format!("ws://{}/", self.addr).into_client_request().unwrap();
        let headers = request.headers_mut();
        headers.insert(ORIGIN, HeaderValue::from_static(TEST_ORIGIN));
        if let Some(token) = token {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());
        }
        let (client, _) = connect_async(request).await.unwrap();
        client
    }

    async fn connect_user(&self, user_id: i64) -> Client {
        self.connect(Some(&generate_test_token(user_id, "alice", "alice@example.com")))
            .await
    }

    async fn wait_for_sockets(&self, user_id: i64, expected: usize) {
        let registry = self.state.registry.clone();
        wait_for(|| {
            let registry = registry.clone();
            async move { registry.socket_count(user_id).await == expected }
        })
        .await;
    }
}

/// Next frame that is not a server heartbeat
async fn next_frame(client: &mut Client) -> Message {
    loop {
        match timeout(Duration::from_secs(3), client.next()).await {
            Ok(Some(Ok(Message::Ping(_)))) => continue,
            Ok(Some(Ok(message))) => return message,
            other => panic!("expected a frame, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_unauthorized_socket_is_told_why_and_closed_unregistered() {
    let gateway = TestGateway::spawn().await;
    let forged = create_token("someone-else", USER, "alice", "alice@example.com").unwrap();

    for token in [None, Some(forged.as_str())] {
        let mut client = gateway.connect(token).await;

        match next_frame(&mut client).await {
            Message::Text(text) => {
                let body: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
                assert_eq!(body["status"], "Unauthorized");
            }
            other => panic!("expected the unauthorized envelope, got {:?}", other),
        }
        assert!(matches!(next_frame(&mut client).await, Message::Close(_)));
    }

    assert_eq!(gateway.state.registry.socket_count(USER).await, 0);
    assert!(!gateway.memory.has_topic(&gateway.names.user_topic(USER)));
}

#[tokio::test]
async fn test_client_ping_is_answered_with_the_same_payload() {
    let gateway = TestGateway::spawn().await;
    let mut client = gateway.connect_user(USER).await;
    gateway.wait_for_sockets(USER, 1).await;

    client.send(Message::Ping(b"are-you-there".to_vec().into())).await.unwrap();

    match next_frame(&mut client).await {
        Message::Pong(payload) => assert_eq!(&payload[..], b"are-you-there"),
        other => panic!("expected a pong, got {:?}", other),
    }
}

#[tokio::test]
async fn test_published_envelope_reaches_the_socket() {
    let gateway = TestGateway::spawn().await;
    let publisher = Publisher::new(Broker::Memory(gateway.memory.clone()), gateway.names.clone());
    publisher.ensure_user_topic(USER).await.unwrap();

    let mut client = gateway.connect_user(USER).await;
    gateway.wait_for_sockets(USER, 1).await;

    let envelope = Envelope::notification("Bill Consolidated", "Room dinner is ready to settle").unwrap();
    publisher.send_to_user(USER, &envelope).await.unwrap();

    match next_frame(&mut client).await {
        Message::Text(text) => assert_eq!(Envelope::from_slice(text.as_str().as_bytes()).unwrap(), envelope),
        other => panic!("expected the envelope, got {:?}", other),
    }
}

#[tokio::test]
async fn test_closing_the_last_socket_tears_down_the_consumer() {
    let gateway = TestGateway::spawn().await;
    let registry = gateway.state.registry.clone();
    let topic = gateway.names.user_topic(USER);

    let mut first = gateway.connect_user(USER).await;
    let mut second = gateway.connect_user(USER).await;
    gateway.wait_for_sockets(USER, 2).await;
    assert!(registry.has_consumer(USER).await);

    first.close(None).await.unwrap();
    gateway.wait_for_sockets(USER, 1).await;
    assert!(registry.has_consumer(USER).await);

    second.close(None).await.unwrap();
    gateway.wait_for_sockets(USER, 0).await;
    assert!(!registry.has_consumer(USER).await);
    wait_for(|| {
        let (memory, topic) = (gateway.memory.clone(), topic.clone());
        async move { memory.consumer_count(&topic) == 0 }
    })
    .await;
}

#[tokio::test]
async fn test_unreachable_broker_closes_the_first_socket() {
    let gateway = TestGateway::spawn().await;
    gateway.memory.fail_subscriptions(&gateway.names.user_topic(USER), true);

    let mut client = gateway.connect_user(USER).await;

    assert!(matches!(next_frame(&mut client).await, Message::Close(_)));
    assert_eq!(gateway.state.registry.socket_count(USER).await, 0);
    assert!(!gateway.state.registry.has_consumer(USER).await);
}
