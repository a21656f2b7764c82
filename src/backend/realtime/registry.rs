//! Connection registry for the gateway.
//!
//! A single task owns the map `user_id → { connection_id → socket }` and
//! every user's consumer. Attach, detach, fan-out and consumer bookkeeping
//! all arrive as commands on one channel, so the last-socket check and the
//! consumer teardown can never interleave with a concurrent attach.
//!
//! Lifecycle of a user's consumer:
//!
//! 1. The first attach creates the entry and spawns the consumer task.
//! 2. Later attaches only add their socket.
//! 3. The last detach removes the entry and cancels the consumer. Its join
//!    handle is parked in `retiring`; the next consumer for that user waits
//!    for it before subscribing, so two consumers never overlap.
//! 4. A consumer that fails mid-stream reports back and its entry is marked
//!    as having none; the next attach starts a fresh one.
//!
//! The attach that starts a consumer does not return until the broker
//! subscription exists. If subscribing fails, the user's entry is dropped
//! and every socket registered under it is evicted.
//!
//! Fan-out never drops a frame on a full socket queue. The consumer copies
//! the user's queues out of the registry and waits on each one in turn, so a
//! slow socket holds back the broker read instead of losing messages that
//! were already consumed.

use std::collections::HashMap;

use axum::extract::ws::Message;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::consumer::ConsumerTask;
use crate::backend::broker::{Broker, BrokerError, TopicNames};

/// Outbound frames buffered per socket; fan-out waits when it is full
pub const SOCKET_BUFFER: usize = 64;

/// Opaque id of one WebSocket connection
pub type ConnId = Uuid;

/// Resolves once the user's consumer has subscribed
pub(crate) type ReadySender = oneshot::Sender<Result<(), BrokerError>>;

/// What `attach` tells the socket task
#[derive(Debug, Clone)]
pub struct Attached {
    pub conn_id: ConnId,
    /// True iff this attach started the user's consumer
    pub is_initializing_user: bool,
    /// Cancelled when the registry drops this socket on its own
    pub evicted: CancellationToken,
}

/// Why a socket could not be registered
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("connection registry is shut down")]
    Closed,

    #[error("user consumer could not subscribe: {0}")]
    Subscribe(#[from] BrokerError),
}

struct UserConsumer {
    generation: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

struct SocketSlot {
    queue: mpsc::Sender<Message>,
    evicted: CancellationToken,
}

struct UserEntry {
    sockets: HashMap<ConnId, SocketSlot>,
    consumer: Option<UserConsumer>,
}

struct Registration {
    attached: Attached,
    /// Present only for the attach that started the consumer
    ready: Option<oneshot::Receiver<Result<(), BrokerError>>>,
}

enum Command {
    Attach {
        user_id: i64,
        socket: mpsc::Sender<Message>,
        reply: oneshot::Sender<Registration>,
    },
    Detach {
        user_id: i64,
        conn_id: ConnId,
        reply: oneshot::Sender<bool>,
    },
    Sockets {
        user_id: i64,
        reply: oneshot::Sender<Vec<(ConnId, mpsc::Sender<Message>)>>,
    },
    SubscribeFailed {
        user_id: i64,
        generation: u64,
        error: BrokerError,
        ready: ReadySender,
    },
    ConsumerExited {
        user_id: i64,
        generation: u64,
    },
    SocketCount {
        user_id: i64,
        reply: oneshot::Sender<usize>,
    },
    HasConsumer {
        user_id: i64,
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<Vec<JoinHandle<()>>>,
    },
}

/// Handle to the registry task
#[derive(Clone)]
pub struct ConnectionRegistry {
    commands: mpsc::UnboundedSender<Command>,
}

impl ConnectionRegistry {
    /// Spawn the registry task; consumers it starts read from `broker`
    pub fn spawn(broker: Broker, names: TopicNames) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let actor = RegistryActor {
            broker,
            names,
            commands: commands.downgrade(),
            users: HashMap::new(),
            retiring: HashMap::new(),
            next_generation: 0,
        };
        tokio::spawn(actor.run(receiver));
        Self { commands }
    }

    /// Register a socket's outbound queue under `user_id`
    ///
    /// When this attach starts the user's consumer it waits for the broker
    /// subscription. A failed subscription leaves nothing registered.
    pub async fn attach(&self, user_id: i64, socket: mpsc::Sender<Message>) -> Result<Attached, AttachError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Attach { user_id, socket, reply })
            .map_err(|_| AttachError::Closed)?;
        let registration = response.await.map_err(|_| AttachError::Closed)?;

        let Some(ready) = registration.ready else {
            return Ok(registration.attached);
        };
        match ready.await {
            Ok(Ok(())) => Ok(registration.attached),
            Ok(Err(e)) => Err(AttachError::Subscribe(e)),
            // Consumer cancelled before subscribing, only happens on shutdown
            Err(_) => Err(AttachError::Closed),
        }
    }

    /// Remove a socket; returns true when it was the user's last one
    pub async fn detach(&self, user_id: i64, conn_id: ConnId) -> bool {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Detach { user_id, conn_id, reply }).is_err() {
            return false;
        }
        response.await.unwrap_or(false)
    }

    /// Queue `payload` on every socket of `user_id`
    ///
    /// Waits for room in each socket's queue. A socket whose queue is closed
    /// is logged and skipped. Returns how many sockets took the frame.
    pub async fn broadcast(&self, user_id: i64, payload: Bytes) -> usize {
        let sockets = self.sockets(user_id).await;
        if sockets.is_empty() {
            tracing::debug!("[Gateway] Dropping message for disconnected user {}", user_id);
            return 0;
        }

        let frame = text_frame(payload);
        let mut delivered = 0;
        for (conn_id, socket) in sockets {
            match socket.send(frame.clone()).await {
                Ok(()) => delivered += 1,
                Err(_) => tracing::warn!("[Gateway] Write to {} of user {} failed: socket closed", conn_id, user_id),
            }
        }
        delivered
    }

    async fn sockets(&self, user_id: i64) -> Vec<(ConnId, mpsc::Sender<Message>)> {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Sockets { user_id, reply }).is_err() {
            return Vec::new();
        }
        response.await.unwrap_or_default()
    }

    pub(crate) fn subscribe_failed(&self, user_id: i64, generation: u64, error: BrokerError, ready: ReadySender) {
        if let Err(mpsc::error::SendError(command)) = self.commands.send(Command::SubscribeFailed {
            user_id,
            generation,
            error,
            ready,
        }) {
            if let Command::SubscribeFailed { error, ready, .. } = command {
                let _ = ready.send(Err(error));
            }
        }
    }

    pub(crate) fn consumer_exited(&self, user_id: i64, generation: u64) {
        let _ = self.commands.send(Command::ConsumerExited { user_id, generation });
    }

    pub async fn socket_count(&self, user_id: i64) -> usize {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::SocketCount { user_id, reply }).is_err() {
            return 0;
        }
        response.await.unwrap_or(0)
    }

    /// Whether a consumer is running for `user_id`
    pub async fn has_consumer(&self, user_id: i64) -> bool {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::HasConsumer { user_id, reply }).is_err() {
            return false;
        }
        response.await.unwrap_or(false)
    }

    /// Cancel every consumer, close every socket queue and wait for the
    /// consumer tasks to finish
    pub async fn shutdown(&self) {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).is_err() {
            return;
        }
        if let Ok(tasks) = response.await {
            for task in tasks {
                let _ = task.await;
            }
        }
    }
}

struct RegistryActor {
    broker: Broker,
    names: TopicNames,
    /// Weak so that dropping every handle stops the actor
    commands: mpsc::WeakUnboundedSender<Command>,
    users: HashMap<i64, UserEntry>,
    retiring: HashMap<i64, (u64, JoinHandle<()>)>,
    next_generation: u64,
}

impl RegistryActor {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = receiver.recv().await {
            match command {
                Command::Attach { user_id, socket, reply } => {
                    let registration = self.attach(user_id, socket);
                    let _ = reply.send(registration);
                }
                Command::Detach { user_id, conn_id, reply } => {
                    let was_last = self.detach(user_id, conn_id);
                    let _ = reply.send(was_last);
                }
                Command::Sockets { user_id, reply } => {
                    let sockets = self.users.get(&user_id).map_or_else(Vec::new, |entry| {
                        entry
                            .sockets
                            .iter()
                            .map(|(conn_id, slot)| (*conn_id, slot.queue.clone()))
                            .collect()
                    });
                    let _ = reply.send(sockets);
                }
                Command::SubscribeFailed {
                    user_id,
                    generation,
                    error,
                    ready,
                } => {
                    self.subscribe_failed(user_id, generation);
                    let _ = ready.send(Err(error));
                }
                Command::ConsumerExited { user_id, generation } => self.consumer_exited(user_id, generation),
                Command::SocketCount { user_id, reply } => {
                    let count = self.users.get(&user_id).map_or(0, |entry| entry.sockets.len());
                    let _ = reply.send(count);
                }
                Command::HasConsumer { user_id, reply } => {
                    let running = self
                        .users
                        .get(&user_id)
                        .is_some_and(|entry| entry.consumer.is_some());
                    let _ = reply.send(running);
                }
                Command::Shutdown { reply } => {
                    let _ = reply.send(self.shutdown());
                    break;
                }
            }
        }
        tracing::debug!("[Gateway] Registry stopped");
    }

    fn attach(&mut self, user_id: i64, socket: mpsc::Sender<Message>) -> Registration {
        let conn_id = Uuid::new_v4();
        let evicted = CancellationToken::new();
        let slot = SocketSlot {
            queue: socket,
            evicted: evicted.clone(),
        };
        let entry = self.users.entry(user_id).or_insert_with(|| UserEntry {
            sockets: HashMap::new(),
            consumer: None,
        });
        entry.sockets.insert(conn_id, slot);
        let needs_consumer = entry.consumer.is_none();

        let mut ready = None;
        if needs_consumer {
            let (ready_tx, ready_rx) = oneshot::channel();
            let consumer = self.start_consumer(user_id, ready_tx);
            if let Some(entry) = self.users.get_mut(&user_id) {
                entry.consumer = consumer;
            }
            ready = Some(ready_rx);
        }

        let sockets = self.users.get(&user_id).map_or(0, |entry| entry.sockets.len());
        tracing::info!("[Gateway] User {} attached {} ({} open)", user_id, conn_id, sockets);
        Registration {
            attached: Attached {
                conn_id,
                is_initializing_user: needs_consumer,
                evicted,
            },
            ready,
        }
    }

    fn start_consumer(&mut self, user_id: i64, ready: ReadySender) -> Option<UserConsumer> {
        let registry = ConnectionRegistry {
            commands: self.commands.upgrade()?,
        };
        self.next_generation += 1;
        let generation = self.next_generation;
        let token = CancellationToken::new();
        let previous = self.retiring.remove(&user_id).map(|(_, task)| task);

        let task = tokio::spawn(
            ConsumerTask {
                user_id,
                generation,
                broker: self.broker.clone(),
                names: self.names.clone(),
                registry,
                token: token.clone(),
                previous,
                ready,
            }
            .run(),
        );
        Some(UserConsumer { generation, token, task })
    }

    fn detach(&mut self, user_id: i64, conn_id: ConnId) -> bool {
        let Some(entry) = self.users.get_mut(&user_id) else {
            return false;
        };
        if entry.sockets.remove(&conn_id).is_none() {
            return false;
        }
        if !entry.sockets.is_empty() {
            tracing::info!("[Gateway] User {} detached {} ({} open)", user_id, conn_id, entry.sockets.len());
            return false;
        }

        if let Some(entry) = self.users.remove(&user_id) {
            if let Some(consumer) = entry.consumer {
                consumer.token.cancel();
                self.retiring.insert(user_id, (consumer.generation, consumer.task));
            }
        }
        tracing::info!("[Gateway] User {} detached {}, consumer stopped", user_id, conn_id);
        true
    }

    fn subscribe_failed(&mut self, user_id: i64, generation: u64) {
        let current = self
            .users
            .get(&user_id)
            .is_some_and(|entry| entry.consumer.as_ref().is_some_and(|c| c.generation == generation));
        if current {
            if let Some(entry) = self.users.remove(&user_id) {
                tracing::warn!(
                    "[Gateway] Consumer for user {} could not subscribe, evicting {} sockets",
                    user_id,
                    entry.sockets.len()
                );
                for slot in entry.sockets.into_values() {
                    slot.evicted.cancel();
                }
            }
        }
        if self.retiring.get(&user_id).is_some_and(|(g, _)| *g == generation) {
            self.retiring.remove(&user_id);
        }
    }

    fn consumer_exited(&mut self, user_id: i64, generation: u64) {
        if let Some(entry) = self.users.get_mut(&user_id) {
            if entry.consumer.as_ref().is_some_and(|c| c.generation == generation) {
                tracing::warn!("[Gateway] Consumer for user {} exited, next attach restarts it", user_id);
                entry.consumer = None;
            }
        }
        if self.retiring.get(&user_id).is_some_and(|(g, _)| *g == generation) {
            self.retiring.remove(&user_id);
        }
    }

    fn shutdown(&mut self) -> Vec<JoinHandle<()>> {
        let mut tasks: Vec<JoinHandle<()>> = self.retiring.drain().map(|(_, (_, task))| task).collect();
        for (_, entry) in self.users.drain() {
            for slot in entry.sockets.into_values() {
                slot.evicted.cancel();
            }
            if let Some(consumer) = entry.consumer {
                consumer.token.cancel();
                tasks.push(consumer.task);
            }
        }
        tracing::info!("[Gateway] Registry shutting down, waiting on {} consumers", tasks.len());
        tasks
    }
}

/// Envelopes are UTF-8 JSON; anything else goes out as a binary frame
fn text_frame(payload: Bytes) -> Message {
    match String::from_utf8(payload.to_vec()) {
        Ok(text) => Message::Text(text.into()),
        Err(_) => Message::Binary(payload),
    }
}
