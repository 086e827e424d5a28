//! Rendering-side loop

use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    bridge::{BridgeMessage, BridgeReceiver},
    render::{reconcile, RenderCache},
    state::ActivityRegistry,
};

/// Reconcile the render cache on every bridge notification.
///
/// Messages are only a trigger: the batch is always re-read from the registry.
pub async fn render_loop_task(
    mut bridge_rx: BridgeReceiver,
    registry: Arc<ActivityRegistry>,
    cache: RenderCache,
) {
    info!("Starting render loop");

    while let Some(message) = bridge_rx.recv().await {
        match message {
            BridgeMessage::ActivityListChanged => {
                let batch = registry.batch();
                let report = reconcile(&cache, &batch);
                if report.created > 0 {
                    debug!("Render loop created {} items", report.created);
                }
            }
        }
    }

    info!("Bridge closed, stopping render loop");
}
