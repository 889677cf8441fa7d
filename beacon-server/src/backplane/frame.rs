use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use beacon_core::{ConnectionId, RoomId, ServerEvent, User, UserId};

use crate::error::RelayError;

/// Идентификатор одного серверного процесса на общем канале.
/// Каждый кадр несёт свой origin, чтобы инстанс не применял собственные
/// публикации повторно.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One cross-instance message on the shared channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    pub origin: InstanceId,
    pub kind: FrameKind,
}

/// What a frame carries: either a delivery (the receiving instance pushes the
/// event to whichever targets it hosts locally) or a state mirror (the
/// receiving instance updates its registry/room maps without emitting
/// anything — the originating instance owns the broadcast).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameKind {
    /// Deliver to one connection, wherever it lives. An id nobody hosts is a
    /// stale target and is absorbed silently.
    ToConnection {
        target: ConnectionId,
        event: ServerEvent,
    },

    /// Deliver to every connection on every instance.
    AllConnections { event: ServerEvent },

    /// Deliver to the members of a room, minus `except`.
    Room {
        room_id: RoomId,
        except: Option<ConnectionId>,
        event: ServerEvent,
    },

    /// Mirror a presence upsert into remote registries.
    UserUpserted { user: User },

    /// Mirror a presence removal.
    UserRemoved { user_id: UserId },

    /// Mirror a room join.
    MemberJoined {
        room_id: RoomId,
        connection_id: ConnectionId,
        user_info: Value,
    },

    /// Mirror a room leave.
    MemberLeft {
        room_id: RoomId,
        connection_id: ConnectionId,
    },
}

/// Куда уходят кадры. Релей публикует через этот шов; тесты подставляют
/// in-memory реализацию вместо Redis.
///
/// Contract: frames published by one instance for one target arrive in
/// publish order, and a publish that cannot reach the channel fails loudly.
#[async_trait]
pub trait Backplane: Send + Sync {
    async fn publish(&self, frame: &Frame) -> Result<(), RelayError>;
}
