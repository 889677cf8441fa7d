use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::connection::ConnectionId;

/// Стабильная идентичность на уровне приложения, не привязанная к соединению.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct UserId(pub String);

impl UserId {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One presence row: a user identity and the connection currently speaking
/// for it. Re-registration replaces `connection_id` (last write wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub connection_id: ConnectionId,
}

/// Identity a caller attaches to `call-user`. Both fields are optional on the
/// wire; the call coordinator refuses the message unless both are filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallerInfo {
    pub id: Option<String>,
    pub username: Option<String>,
}

impl CallerInfo {
    pub fn is_complete(&self) -> bool {
        let filled = |f: &Option<String>| f.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.id) && filled(&self.username)
    }
}
