//! Notifications from the driving side to the rendering side
//!
//! Messages carry no state. A receiver treats every message, and every gap
//! caused by lagging behind the channel, as "re-read the registry".

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

pub const DEFAULT_BRIDGE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    #[serde(rename = "activities-list")]
    ActivityListChanged,
}

#[derive(Debug, Clone)]
pub struct Bridge {
    tx: broadcast::Sender<BridgeMessage>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_CAPACITY)
    }
}

impl Bridge {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire-and-forget "the activity list changed"
    pub fn notify(&self) {
        if self.tx.send(BridgeMessage::ActivityListChanged).is_err() {
            debug!("No renderer subscribed, dropping activity list notification");
        }
    }

    pub fn subscribe(&self) -> BridgeReceiver {
        BridgeReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

pub struct BridgeReceiver {
    rx: broadcast::Receiver<BridgeMessage>,
}

impl BridgeReceiver {
    /// Next message, or `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<BridgeMessage> {
        match self.rx.recv().await {
            Ok(message) => Some(message),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Renderer lagged behind by {} notifications, coalescing", skipped);
                Some(BridgeMessage::ActivityListChanged)
            }
            Err(RecvError::Closed) => None,
        }
    }
}
