//! In-memory presence: which user is represented by which live connection.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use beacon_core::{ConnectionId, ServerEvent, User, UserId};

use crate::backplane::FrameKind;
use crate::error::RelayError;
use crate::signaling::Fanout;

#[derive(Default)]
struct RegistryInner {
    users: HashMap<UserId, User>,
    by_connection: HashMap<ConnectionId, UserId>,
}

impl RegistryInner {
    /// Upsert one row, keeping both invariants: at most one row per user id,
    /// at most one user id bound to a connection.
    fn upsert(&mut self, user: User) {
        if let Some(prev_user) = self
            .by_connection
            .insert(user.connection_id, user.user_id.clone())
        {
            if prev_user != user.user_id {
                self.users.remove(&prev_user);
            }
        }

        if let Some(prev) = self.users.insert(user.user_id.clone(), user.clone()) {
            if prev.connection_id != user.connection_id {
                self.by_connection.remove(&prev.connection_id);
            }
        }
    }

    fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<UserId> {
        let user_id = self.by_connection.remove(&connection_id)?;
        self.users.remove(&user_id);
        Some(user_id)
    }

    /// Full snapshot, ordered by user id. Recomputed on every change rather
    /// than diffed, matching the broadcast contract.
    fn snapshot(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        users
    }
}

/// Who is online. Both maps mutate under one lock, and the mirror publish
/// and snapshot broadcast happen while that lock is still held, so snapshots
/// always leave in mutation order: no client can see a snapshot computed
/// before the change that produced a later one.
pub struct PresenceRegistry {
    inner: Mutex<RegistryInner>,
    fanout: Arc<Fanout>,
}

impl PresenceRegistry {
    pub fn new(fanout: Arc<Fanout>) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            fanout,
        }
    }

    /// Upsert the row for `user_id`, mirror it to the other instances and
    /// broadcast the new snapshot to every connection. Re-registration under
    /// a new connection replaces the old binding (last write wins).
    pub async fn register(
        &self,
        user_id: UserId,
        username: String,
        connection_id: ConnectionId,
    ) -> Result<(), RelayError> {
        if user_id.is_empty() {
            return Err(RelayError::InvalidRegistration(
                "userId must be non-empty".to_string(),
            ));
        }

        let user = User {
            user_id,
            username,
            connection_id,
        };

        let mut inner = self.inner.lock().await;
        inner.upsert(user.clone());
        let snapshot = inner.snapshot();

        self.fanout.publish(FrameKind::UserUpserted { user }).await?;
        self.fanout
            .to_all(ServerEvent::UsersUpdated { users: snapshot })
            .await
    }

    /// Find the connection currently representing `user_id`.
    pub async fn resolve(&self, user_id: &UserId) -> Option<ConnectionId> {
        let inner = self.inner.lock().await;
        inner.users.get(user_id).map(|u| u.connection_id)
    }

    /// Drop whatever user the connection represented, mirroring and
    /// broadcasting like `register`. Returns the removed user id, or
    /// `Ok(None)` if the connection was never registered (idempotent,
    /// nothing to broadcast).
    pub async fn unregister(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<UserId>, RelayError> {
        let mut inner = self.inner.lock().await;
        let Some(user_id) = inner.remove_connection(connection_id) else {
            return Ok(None);
        };
        let snapshot = inner.snapshot();

        self.fanout
            .publish(FrameKind::UserRemoved {
                user_id: user_id.clone(),
            })
            .await?;
        self.fanout
            .to_all(ServerEvent::UsersUpdated { users: snapshot })
            .await?;
        Ok(Some(user_id))
    }

    /// Mirror an upsert that happened on another instance. No broadcast here;
    /// the originating instance owns that.
    pub async fn apply_upsert(&self, user: User) {
        self.inner.lock().await.upsert(user);
    }

    /// Mirror a removal from another instance.
    pub async fn apply_remove(&self, user_id: &UserId) {
        let mut inner = self.inner.lock().await;
        if let Some(user) = inner.users.remove(user_id) {
            inner.by_connection.remove(&user.connection_id);
        }
    }
}
