//! Two-party call handshake relay.
//!
//! The server holds no call state between messages. Each transition is driven
//! by the next inbound message and relayed immediately; legal ordering is the
//! clients' problem. What the server does enforce is target resolution:
//! `call-user` never rings anyone unless the target user actually resolves.

use std::sync::Arc;

use serde_json::Value;

use beacon_core::{CallerInfo, ConnectionId, ServerEvent, UserId};

use crate::error::RelayError;
use crate::presence::PresenceRegistry;
use crate::signaling::Fanout;

pub struct CallCoordinator {
    registry: Arc<PresenceRegistry>,
    fanout: Arc<Fanout>,
}

impl CallCoordinator {
    pub fn new(registry: Arc<PresenceRegistry>, fanout: Arc<Fanout>) -> Self {
        Self { registry, fanout }
    }

    /// `call-user`: validate the caller's identity, resolve the target, ring
    /// it, confirm dispatch to the caller. The caller's connection id becomes
    /// the `callId` for the rest of the handshake.
    pub async fn call_user(
        &self,
        caller_connection: ConnectionId,
        target_user_id: UserId,
        caller_info: CallerInfo,
        offer: Value,
    ) -> Result<(), RelayError> {
        if !caller_info.is_complete() {
            return Err(RelayError::InvalidCallerInfo);
        }

        let target = self
            .registry
            .resolve(&target_user_id)
            .await
            .ok_or_else(|| RelayError::TargetNotFound(target_user_id.clone()))?;

        self.fanout
            .to_connection(
                target,
                ServerEvent::IncomingCall {
                    caller: caller_info,
                    offer,
                    call_id: caller_connection,
                },
            )
            .await?;

        self.fanout.send_local(
            caller_connection,
            &ServerEvent::CallDispatched { target_user_id },
        );
        Ok(())
    }

    /// `answer-call`: relay to the connection named by `callId`. No existence
    /// check beyond reachability; a stale call id is dropped silently.
    pub async fn answer_call(
        &self,
        call_id: ConnectionId,
        answer: Value,
        user_info: Value,
    ) -> Result<(), RelayError> {
        self.fanout
            .to_connection(call_id, ServerEvent::CallAnswered { answer, user_info })
            .await
    }

    pub async fn reject_call(&self, call_id: ConnectionId) -> Result<(), RelayError> {
        self.fanout
            .to_connection(call_id, ServerEvent::CallRejected)
            .await
    }

    pub async fn end_call(&self, target: ConnectionId) -> Result<(), RelayError> {
        self.fanout
            .to_connection(target, ServerEvent::CallEnded)
            .await
    }

    /// `ice-candidate`: pass-through. The candidate payload is opaque and is
    /// relayed exactly as received.
    pub async fn relay_ice_candidate(
        &self,
        from: ConnectionId,
        target: ConnectionId,
        candidate: Value,
    ) -> Result<(), RelayError> {
        self.fanout
            .to_connection(
                target,
                ServerEvent::IceCandidate {
                    candidate,
                    from_connection_id: from,
                },
            )
            .await
    }
}
