use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::Level;

use beacon_core::{ClientMessage, ConnectionId, ServerEvent, UserId};
use beacon_server::backplane::InstanceId;
use beacon_server::signaling::RelayService;

use crate::utils::MemoryBackplane;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One relay wired to a recording in-memory backplane.
pub fn single_instance() -> (Arc<MemoryBackplane>, Arc<RelayService>) {
    let backplane = MemoryBackplane::new();
    let relay = RelayService::new(backplane.clone(), InstanceId::new());
    backplane.subscribe(relay.clone());
    (backplane, relay)
}

/// `count` relay instances sharing one in-memory backplane, as if they were
/// separate processes on the same Redis channel.
pub fn cluster(count: usize) -> (Arc<MemoryBackplane>, Vec<Arc<RelayService>>) {
    let backplane = MemoryBackplane::new();
    let relays: Vec<_> = (0..count)
        .map(|_| {
            let relay = RelayService::new(backplane.clone(), InstanceId::new());
            backplane.subscribe(relay.clone());
            relay
        })
        .collect();
    (backplane, relays)
}

/// A fake socket: holds the outbox receiver the gateway would normally pump
/// into a WebSocket, and decodes the queued frames back into events.
pub struct TestClient {
    pub id: ConnectionId,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl TestClient {
    /// Attach to a relay the way the WS handler does, consuming the
    /// `welcome` event on the way.
    pub fn connect(relay: &Arc<RelayService>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new();
        relay.connect(id, tx);

        let mut client = Self { id, rx };
        let welcome = client.try_recv().expect("welcome event after connect");
        assert_eq!(welcome, ServerEvent::Welcome { connection_id: id });
        client
    }

    pub fn try_recv(&mut self) -> Option<ServerEvent> {
        match self.rx.try_recv() {
            Ok(Message::Text(text)) => {
                Some(serde_json::from_str(&text).expect("well-formed server event"))
            }
            _ => None,
        }
    }

    /// All currently queued events.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn assert_silent(&mut self) {
        assert_eq!(self.drain(), Vec::<ServerEvent>::new());
    }
}

pub async fn register(relay: &Arc<RelayService>, client: &TestClient, user_id: &str, name: &str) {
    relay
        .handle_message(
            client.id,
            ClientMessage::RegisterUser {
                user_id: UserId::from(user_id),
                username: name.to_string(),
            },
        )
        .await;
}
