//! Redis pub/sub implementation of the fan-out backplane.
//!
//! Every instance publishes on one shared channel and subscribes to the same
//! channel. Redis preserves publish order per publishing connection, which is
//! what keeps two ICE candidates for the same target from arriving swapped.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::{error, info, warn};

use crate::backplane::{Backplane, Frame};
use crate::error::RelayError;
use crate::signaling::RelayService;

/// The channel every instance shares.
pub const FANOUT_CHANNEL: &str = "beacon:fanout";

/// Fan-out over Redis pub/sub.
///
/// The `MultiplexedConnection` is cheaply cloneable and safe for concurrent
/// use; publishes clone it per call. The subscriber side needs its own
/// dedicated connection, created in [`RedisBackplane::run_subscriber`].
pub struct RedisBackplane {
    client: redis::Client,
    connection: MultiplexedConnection,
}

impl RedisBackplane {
    /// Connect for publishing. A failure here must keep the process from
    /// accepting any client connections.
    pub async fn connect(redis_url: &str) -> Result<Self, RelayError> {
        // The URL may embed credentials; log only the error.
        let client = redis::Client::open(redis_url).map_err(|e| {
            error!(error = %e, "failed to open redis client");
            RelayError::BackplaneUnavailable(e.to_string())
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!(error = %e, "failed to connect to redis");
                RelayError::BackplaneUnavailable(e.to_string())
            })?;

        Ok(Self { client, connection })
    }

    /// Subscribe and pump peer frames into the relay until the stream ends.
    /// Runs as a background task; returning is a fatal condition for the
    /// caller to escalate.
    pub async fn run_subscriber(&self, relay: Arc<RelayService>) -> Result<(), RelayError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| RelayError::BackplaneUnavailable(e.to_string()))?;
        pubsub
            .subscribe(FANOUT_CHANNEL)
            .await
            .map_err(|e| RelayError::BackplaneUnavailable(e.to_string()))?;

        info!(channel = FANOUT_CHANNEL, "backplane subscriber started");

        let mut messages = pubsub.on_message();
        while let Some(msg) = messages.next().await {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "unreadable backplane payload");
                    continue;
                }
            };

            match serde_json::from_str::<Frame>(&payload) {
                Ok(frame) => relay.apply_remote(frame).await,
                Err(e) => warn!(error = %e, "malformed backplane frame"),
            }
        }

        Err(RelayError::BackplaneUnavailable(
            "subscription stream ended".to_string(),
        ))
    }
}

#[async_trait]
impl Backplane for RedisBackplane {
    async fn publish(&self, frame: &Frame) -> Result<(), RelayError> {
        let payload = serde_json::to_string(frame)
            .map_err(|e| RelayError::BackplaneUnavailable(e.to_string()))?;

        let mut connection = self.connection.clone();
        connection
            .publish::<_, _, ()>(FANOUT_CHANNEL, payload)
            .await
            .map_err(|e| RelayError::BackplaneUnavailable(e.to_string()))
    }
}
