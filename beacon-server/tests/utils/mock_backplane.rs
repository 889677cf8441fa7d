use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use beacon_server::backplane::{Backplane, Frame};
use beacon_server::error::RelayError;
use beacon_server::signaling::RelayService;

/// In-memory stand-in for the Redis channel. Records every published frame
/// and forwards it to every subscribed relay instance; origin filtering
/// happens in `apply_remote`, exactly as with the real channel.
#[derive(Default)]
pub struct MemoryBackplane {
    frames: Mutex<Vec<Frame>>,
    subscribers: Mutex<Vec<Arc<RelayService>>>,
}

impl MemoryBackplane {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(&self, relay: Arc<RelayService>) {
        self.subscribers.lock().unwrap().push(relay);
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backplane for MemoryBackplane {
    async fn publish(&self, frame: &Frame) -> Result<(), RelayError> {
        self.frames.lock().unwrap().push(frame.clone());

        let subscribers: Vec<_> = self.subscribers.lock().unwrap().clone();
        for relay in subscribers {
            relay.apply_remote(frame.clone()).await;
        }
        Ok(())
    }
}

/// A backplane whose very first publish stalls for `delay` before going
/// through, widening the window between a mutation and its fan-out so tests
/// can race a second handler into it.
pub struct StallingBackplane {
    delay: Duration,
    stalled: AtomicBool,
}

impl StallingBackplane {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            stalled: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Backplane for StallingBackplane {
    async fn publish(&self, _frame: &Frame) -> Result<(), RelayError> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

/// A backplane whose link is down. Every publish fails loudly.
pub struct FailingBackplane;

#[async_trait]
impl Backplane for FailingBackplane {
    async fn publish(&self, _frame: &Frame) -> Result<(), RelayError> {
        Err(RelayError::BackplaneUnavailable(
            "injected failure".to_string(),
        ))
    }
}
