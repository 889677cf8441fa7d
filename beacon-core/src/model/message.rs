use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::connection::ConnectionId;
use crate::model::room::{RoomId, RoomMember};
use crate::model::user::{CallerInfo, User, UserId};

/// Everything a client can send over its WebSocket.
///
/// Envelope is `{"op": "<name>", "d": {...}}`. Op names and payload field
/// names are part of the wire contract and must not change. SDP offers,
/// answers, ICE candidates and room `userInfo` are opaque to the server and
/// stay `Value` so they are relayed bit for bit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    #[serde(rename = "register-user", rename_all = "camelCase")]
    RegisterUser { user_id: UserId, username: String },

    #[serde(rename = "call-user", rename_all = "camelCase")]
    CallUser {
        target_user_id: UserId,
        caller_info: CallerInfo,
        offer: Value,
    },

    #[serde(rename = "answer-call", rename_all = "camelCase")]
    AnswerCall {
        call_id: ConnectionId,
        answer: Value,
        user_info: Value,
    },

    #[serde(rename = "reject-call", rename_all = "camelCase")]
    RejectCall { call_id: ConnectionId },

    #[serde(rename = "end-call", rename_all = "camelCase")]
    EndCall { target_connection_id: ConnectionId },

    #[serde(rename = "ice-candidate", rename_all = "camelCase")]
    IceCandidate {
        target_connection_id: ConnectionId,
        candidate: Value,
    },

    #[serde(rename = "join-room", rename_all = "camelCase")]
    JoinRoom { room_id: RoomId, user_info: Value },

    #[serde(rename = "leave-room", rename_all = "camelCase")]
    LeaveRoom { room_id: RoomId },

    #[serde(rename = "room-offer", rename_all = "camelCase")]
    RoomOffer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        target_connection_id: ConnectionId,
        offer: Value,
    },

    #[serde(rename = "room-answer", rename_all = "camelCase")]
    RoomAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        target_connection_id: ConnectionId,
        answer: Value,
    },

    #[serde(rename = "room-ice-candidate", rename_all = "camelCase")]
    RoomIceCandidate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        target_connection_id: ConnectionId,
        candidate: Value,
    },
}

/// Everything the server can push to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum ServerEvent {
    /// Sent once right after the upgrade so the client learns the id other
    /// peers will address it by.
    #[serde(rename = "welcome", rename_all = "camelCase")]
    Welcome { connection_id: ConnectionId },

    /// Full presence snapshot, recomputed and broadcast on every change.
    #[serde(rename = "users-updated", rename_all = "camelCase")]
    UsersUpdated { users: Vec<User> },

    #[serde(rename = "incoming-call", rename_all = "camelCase")]
    IncomingCall {
        caller: CallerInfo,
        offer: Value,
        /// The caller's connection id, reused as the addressing token for the
        /// rest of this handshake.
        call_id: ConnectionId,
    },

    /// Confirmation to the caller that `incoming-call` was dispatched.
    #[serde(rename = "call-dispatched", rename_all = "camelCase")]
    CallDispatched { target_user_id: UserId },

    #[serde(rename = "call-failed", rename_all = "camelCase")]
    CallFailed {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_user_id: Option<UserId>,
    },

    #[serde(rename = "call-answered", rename_all = "camelCase")]
    CallAnswered { answer: Value, user_info: Value },

    #[serde(rename = "call-rejected")]
    CallRejected,

    #[serde(rename = "call-ended")]
    CallEnded,

    #[serde(rename = "ice-candidate", rename_all = "camelCase")]
    IceCandidate {
        candidate: Value,
        from_connection_id: ConnectionId,
    },

    #[serde(rename = "user-joined", rename_all = "camelCase")]
    UserJoined {
        connection_id: ConnectionId,
        user_info: Value,
    },

    /// Roster reply to a joiner. Never contains the joiner itself.
    #[serde(rename = "room-members")]
    RoomMembers(Vec<RoomMember>),

    #[serde(rename = "user-left", rename_all = "camelCase")]
    UserLeft { connection_id: ConnectionId },

    #[serde(rename = "room-offer", rename_all = "camelCase")]
    RoomOffer {
        offer: Value,
        caller_connection_id: ConnectionId,
    },

    #[serde(rename = "room-answer", rename_all = "camelCase")]
    RoomAnswer {
        answer: Value,
        caller_connection_id: ConnectionId,
    },

    #[serde(rename = "room-ice-candidate", rename_all = "camelCase")]
    RoomIceCandidate {
        candidate: Value,
        from_connection_id: ConnectionId,
    },

    /// Named failure reported back to the offending connection only.
    #[serde(rename = "error")]
    Error { error: String },
}
