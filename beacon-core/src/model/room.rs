use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::model::connection::ConnectionId;

/// Имя комнаты, задаётся клиентом. Комната создаётся лениво при первом join.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
pub struct RoomId(pub String);

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a room roster. `user_info` is whatever the client supplied on
/// join; the server never looks inside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomMember {
    pub connection_id: ConnectionId,
    pub user_info: Value,
}
