//! Delivery engine: local WebSocket outboxes plus the cross-instance
//! backplane behind one set of send operations.

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{error, warn};

use beacon_core::{ConnectionId, RoomId, ServerEvent};

use crate::backplane::{Backplane, Frame, FrameKind, InstanceId};
use crate::error::RelayError;

pub struct Fanout {
    /// Outbox per connection hosted by this instance.
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    backplane: Arc<dyn Backplane>,
    instance: InstanceId,
}

impl Fanout {
    pub fn new(backplane: Arc<dyn Backplane>, instance: InstanceId) -> Self {
        Self {
            peers: DashMap::new(),
            backplane,
            instance,
        }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn attach(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.peers.insert(connection_id, tx);
    }

    pub fn detach(&self, connection_id: ConnectionId) {
        self.peers.remove(&connection_id);
    }

    /// Push an event to a locally hosted connection. Returns whether the
    /// connection is hosted here; a closed or missing outbox is not an error.
    pub fn send_local(&self, target: ConnectionId, event: &ServerEvent) -> bool {
        let Some(peer) = self.peers.get(&target) else {
            return false;
        };

        match serde_json::to_string(event) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    warn!(connection_id = %target, error = %e, "outbox closed, dropping event");
                }
            }
            Err(e) => error!(error = %e, "failed to serialize server event"),
        }
        true
    }

    /// Push an event to every locally hosted connection.
    pub fn broadcast_local(&self, event: &ServerEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize server event");
                return;
            }
        };

        for peer in self.peers.iter() {
            if let Err(e) = peer.value().send(Message::Text(json.clone().into())) {
                warn!(connection_id = %peer.key(), error = %e, "outbox closed, dropping event");
            }
        }
    }

    /// Deliver to one connection wherever it lives. A locally hosted target
    /// short-circuits; otherwise the frame goes out for whichever instance
    /// hosts it. A target nobody hosts is absorbed silently.
    pub async fn to_connection(
        &self,
        target: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), RelayError> {
        if self.send_local(target, &event) {
            return Ok(());
        }
        self.publish(FrameKind::ToConnection { target, event }).await
    }

    /// Deliver to every connection on every instance.
    pub async fn to_all(&self, event: ServerEvent) -> Result<(), RelayError> {
        self.broadcast_local(&event);
        self.publish(FrameKind::AllConnections { event }).await
    }

    /// Deliver to the given room members, minus `except`. `members` is the
    /// mirrored membership; non-local ids are skipped here and picked up by
    /// the instances hosting them.
    pub async fn to_room(
        &self,
        room_id: RoomId,
        members: &[ConnectionId],
        except: Option<ConnectionId>,
        event: ServerEvent,
    ) -> Result<(), RelayError> {
        for &member in members {
            if Some(member) == except {
                continue;
            }
            self.send_local(member, &event);
        }
        self.publish(FrameKind::Room {
            room_id,
            except,
            event,
        })
        .await
    }

    /// Publish a frame tagged with this instance's id. Awaited in handler
    /// order, which preserves per-target ordering on the channel.
    pub async fn publish(&self, kind: FrameKind) -> Result<(), RelayError> {
        self.backplane
            .publish(&Frame {
                origin: self.instance,
                kind,
            })
            .await
    }
}
