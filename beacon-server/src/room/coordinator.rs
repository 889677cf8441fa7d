//! Multi-party room bookkeeping and relays.
//!
//! Membership is a map keyed by connection id, so a connection joining the
//! same room twice replaces its entry instead of duplicating it. Membership
//! is advisory discovery data, not an access-control boundary: the
//! point-to-point relays never check that the target belongs to the room.
//!
//! Joins and leaves publish their notifications while the membership lock is
//! still held, so rosters and membership events always leave in mutation
//! order.

use std::collections::HashMap;

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use beacon_core::{ConnectionId, RoomId, RoomMember, ServerEvent};

use crate::backplane::FrameKind;
use crate::error::RelayError;
use crate::signaling::Fanout;

pub struct RoomCoordinator {
    rooms: Mutex<HashMap<RoomId, HashMap<ConnectionId, Value>>>,
    fanout: Arc<Fanout>,
}

impl RoomCoordinator {
    pub fn new(fanout: Arc<Fanout>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            fanout,
        }
    }

    /// `join-room`: upsert the membership entry, notify the other members,
    /// reply to the joiner with the roster as it stood before the join.
    pub async fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        user_info: Value,
    ) -> Result<(), RelayError> {
        let mut rooms = self.rooms.lock().await;
        let members = rooms.entry(room_id.clone()).or_insert_with(|| {
            info!(room_id = %room_id, "creating room");
            HashMap::new()
        });

        let mut others: Vec<RoomMember> = members
            .iter()
            .filter(|(id, _)| **id != connection_id)
            .map(|(id, info)| RoomMember {
                connection_id: *id,
                user_info: info.clone(),
            })
            .collect();
        others.sort_by_key(|m| m.connection_id);

        members.insert(connection_id, user_info.clone());

        // Mirror the membership first so the join notification that follows
        // on the same channel finds the entry already applied remotely.
        self.fanout
            .publish(FrameKind::MemberJoined {
                room_id: room_id.clone(),
                connection_id,
                user_info: user_info.clone(),
            })
            .await?;

        let member_ids: Vec<ConnectionId> = others.iter().map(|m| m.connection_id).collect();
        self.fanout
            .to_room(
                room_id,
                &member_ids,
                Some(connection_id),
                ServerEvent::UserJoined {
                    connection_id,
                    user_info,
                },
            )
            .await?;

        self.fanout
            .send_local(connection_id, &ServerEvent::RoomMembers(others));
        Ok(())
    }

    /// `leave-room`: drop the entry and tell whoever is left. A room or
    /// membership that does not exist makes this a no-op.
    pub async fn leave(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
    ) -> Result<(), RelayError> {
        let mut rooms = self.rooms.lock().await;
        let Some(remaining) = Self::remove_member(&mut rooms, &room_id, connection_id) else {
            return Ok(());
        };
        self.notify_left(room_id, connection_id, remaining).await
    }

    /// Transport teardown: leave every room the connection was a member of,
    /// emitting the same `user-left` events an explicit leave would.
    pub async fn purge_connection(&self, connection_id: ConnectionId) -> Result<(), RelayError> {
        let mut rooms = self.rooms.lock().await;
        let mut affected = Vec::new();
        rooms.retain(|room_id, members| {
            if members.remove(&connection_id).is_some() {
                affected.push((room_id.clone(), members.keys().copied().collect()));
            }
            !members.is_empty()
        });

        for (room_id, remaining) in affected {
            self.notify_left(room_id, connection_id, remaining).await?;
        }
        Ok(())
    }

    /// `room-offer`: point-to-point relay, target supplied by the caller.
    pub async fn relay_offer(
        &self,
        from: ConnectionId,
        target: ConnectionId,
        offer: Value,
    ) -> Result<(), RelayError> {
        self.fanout
            .to_connection(
                target,
                ServerEvent::RoomOffer {
                    offer,
                    caller_connection_id: from,
                },
            )
            .await
    }

    /// `room-answer`: point-to-point relay.
    pub async fn relay_answer(
        &self,
        from: ConnectionId,
        target: ConnectionId,
        answer: Value,
    ) -> Result<(), RelayError> {
        self.fanout
            .to_connection(
                target,
                ServerEvent::RoomAnswer {
                    answer,
                    caller_connection_id: from,
                },
            )
            .await
    }

    /// `room-ice-candidate`: point-to-point relay, payload untouched.
    pub async fn relay_ice_candidate(
        &self,
        from: ConnectionId,
        target: ConnectionId,
        candidate: Value,
    ) -> Result<(), RelayError> {
        self.fanout
            .to_connection(
                target,
                ServerEvent::RoomIceCandidate {
                    candidate,
                    from_connection_id: from,
                },
            )
            .await
    }

    /// Mirrored membership of a room, for delivering remote room frames.
    pub async fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Mirror a join from another instance. State only, no events.
    pub async fn apply_join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        user_info: Value,
    ) {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id)
            .or_default()
            .insert(connection_id, user_info);
    }

    /// Mirror a leave from another instance.
    pub async fn apply_leave(&self, room_id: RoomId, connection_id: ConnectionId) {
        let mut rooms = self.rooms.lock().await;
        Self::remove_member(&mut rooms, &room_id, connection_id);
    }

    /// Remove one membership entry, dropping the room when it empties.
    /// Returns the remaining members, or `None` if nothing was removed.
    fn remove_member(
        rooms: &mut HashMap<RoomId, HashMap<ConnectionId, Value>>,
        room_id: &RoomId,
        connection_id: ConnectionId,
    ) -> Option<Vec<ConnectionId>> {
        let members = rooms.get_mut(room_id)?;
        members.remove(&connection_id)?;

        let remaining: Vec<ConnectionId> = members.keys().copied().collect();
        if remaining.is_empty() {
            info!(room_id = %room_id, "room emptied, dropping");
            rooms.remove(room_id);
        }
        Some(remaining)
    }

    async fn notify_left(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        remaining: Vec<ConnectionId>,
    ) -> Result<(), RelayError> {
        self.fanout
            .publish(FrameKind::MemberLeft {
                room_id: room_id.clone(),
                connection_id,
            })
            .await?;
        self.fanout
            .to_room(
                room_id,
                &remaining,
                Some(connection_id),
                ServerEvent::UserLeft { connection_id },
            )
            .await
    }
}
