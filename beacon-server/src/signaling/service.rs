//! The relay hub: one instance of this sits behind every WebSocket handler,
//! dispatching inbound messages to the coordinators and applying frames that
//! arrive from peer instances.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::{info, warn};

use beacon_core::{ClientMessage, ConnectionId, ServerEvent};

use crate::backplane::{Backplane, Frame, FrameKind, InstanceId};
use crate::call::CallCoordinator;
use crate::error::RelayError;
use crate::presence::PresenceRegistry;
use crate::room::RoomCoordinator;
use crate::signaling::Fanout;

pub struct RelayService {
    fanout: Arc<Fanout>,
    registry: Arc<PresenceRegistry>,
    calls: CallCoordinator,
    rooms: RoomCoordinator,
}

impl RelayService {
    pub fn new(backplane: Arc<dyn Backplane>, instance: InstanceId) -> Arc<Self> {
        let fanout = Arc::new(Fanout::new(backplane, instance));
        let registry = Arc::new(PresenceRegistry::new(fanout.clone()));

        Arc::new(Self {
            calls: CallCoordinator::new(registry.clone(), fanout.clone()),
            rooms: RoomCoordinator::new(fanout.clone()),
            fanout,
            registry,
        })
    }

    /// Wire up a freshly upgraded connection and tell it its own id.
    pub fn connect(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.fanout.attach(connection_id, tx);
        self.fanout
            .send_local(connection_id, &ServerEvent::Welcome { connection_id });
    }

    /// Handle one inbound message to completion. The gateway calls this
    /// sequentially per connection, so no two messages from the same
    /// connection ever interleave.
    pub async fn handle_message(&self, connection_id: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::RegisterUser { user_id, username } => {
                let outcome = self.registry.register(user_id, username, connection_id).await;
                self.report_failure(connection_id, outcome);
            }

            ClientMessage::CallUser {
                target_user_id,
                caller_info,
                offer,
            } => {
                let outcome = self
                    .calls
                    .call_user(connection_id, target_user_id.clone(), caller_info, offer)
                    .await;
                if let Err(e) = outcome {
                    let target_user_id = match &e {
                        RelayError::TargetNotFound(_) => Some(target_user_id),
                        _ => None,
                    };
                    self.fanout.send_local(
                        connection_id,
                        &ServerEvent::CallFailed {
                            error: e.to_string(),
                            target_user_id,
                        },
                    );
                }
            }

            ClientMessage::AnswerCall {
                call_id,
                answer,
                user_info,
            } => {
                let outcome = self.calls.answer_call(call_id, answer, user_info).await;
                self.report_call_failure(connection_id, outcome);
            }

            ClientMessage::RejectCall { call_id } => {
                let outcome = self.calls.reject_call(call_id).await;
                self.report_call_failure(connection_id, outcome);
            }

            ClientMessage::EndCall {
                target_connection_id,
            } => {
                let outcome = self.calls.end_call(target_connection_id).await;
                self.report_call_failure(connection_id, outcome);
            }

            ClientMessage::IceCandidate {
                target_connection_id,
                candidate,
            } => {
                let outcome = self
                    .calls
                    .relay_ice_candidate(connection_id, target_connection_id, candidate)
                    .await;
                self.report_call_failure(connection_id, outcome);
            }

            ClientMessage::JoinRoom { room_id, user_info } => {
                let outcome = self.rooms.join(room_id, connection_id, user_info).await;
                self.report_failure(connection_id, outcome);
            }

            ClientMessage::LeaveRoom { room_id } => {
                let outcome = self.rooms.leave(room_id, connection_id).await;
                self.report_failure(connection_id, outcome);
            }

            ClientMessage::RoomOffer {
                target_connection_id,
                offer,
                ..
            } => {
                let outcome = self
                    .rooms
                    .relay_offer(connection_id, target_connection_id, offer)
                    .await;
                self.report_failure(connection_id, outcome);
            }

            ClientMessage::RoomAnswer {
                target_connection_id,
                answer,
                ..
            } => {
                let outcome = self
                    .rooms
                    .relay_answer(connection_id, target_connection_id, answer)
                    .await;
                self.report_failure(connection_id, outcome);
            }

            ClientMessage::RoomIceCandidate {
                target_connection_id,
                candidate,
                ..
            } => {
                let outcome = self
                    .rooms
                    .relay_ice_candidate(connection_id, target_connection_id, candidate)
                    .await;
                self.report_failure(connection_id, outcome);
            }
        }
    }

    /// Transport teardown. Idempotent: a second signal for the same
    /// connection finds nothing to unregister or purge and emits nothing.
    pub async fn handle_disconnect(&self, connection_id: ConnectionId) {
        self.fanout.detach(connection_id);

        match self.registry.unregister(connection_id).await {
            Ok(Some(user_id)) => info!(%connection_id, %user_id, "unregistered on disconnect"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "presence teardown not fanned out"),
        }

        if let Err(e) = self.rooms.purge_connection(connection_id).await {
            warn!(error = %e, "room purge not fanned out");
        }
    }

    /// Apply a frame published by a peer instance. Own frames are skipped:
    /// the originator already delivered locally and mutated its own maps.
    pub async fn apply_remote(&self, frame: Frame) {
        if frame.origin == self.fanout.instance() {
            return;
        }

        match frame.kind {
            FrameKind::ToConnection { target, event } => {
                self.fanout.send_local(target, &event);
            }
            FrameKind::AllConnections { event } => {
                self.fanout.broadcast_local(&event);
            }
            FrameKind::Room {
                room_id,
                except,
                event,
            } => {
                for member in self.rooms.members(&room_id).await {
                    if Some(member) == except {
                        continue;
                    }
                    self.fanout.send_local(member, &event);
                }
            }
            FrameKind::UserUpserted { user } => self.registry.apply_upsert(user).await,
            FrameKind::UserRemoved { user_id } => self.registry.apply_remove(&user_id).await,
            FrameKind::MemberJoined {
                room_id,
                connection_id,
                user_info,
            } => {
                self.rooms.apply_join(room_id, connection_id, user_info).await;
            }
            FrameKind::MemberLeft {
                room_id,
                connection_id,
            } => {
                self.rooms.apply_leave(room_id, connection_id).await;
            }
        }
    }

    /// Report a non-call failure to the sender as a named `error` event.
    fn report_failure(&self, connection_id: ConnectionId, outcome: Result<(), RelayError>) {
        if let Err(e) = outcome {
            self.fanout.send_local(
                connection_id,
                &ServerEvent::Error {
                    error: e.to_string(),
                },
            );
        }
    }

    /// Call-path failures use `call-failed` instead.
    fn report_call_failure(&self, connection_id: ConnectionId, outcome: Result<(), RelayError>) {
        if let Err(e) = outcome {
            self.fanout.send_local(
                connection_id,
                &ServerEvent::CallFailed {
                    error: e.to_string(),
                    target_user_id: None,
                },
            );
        }
    }
}
