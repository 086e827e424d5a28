//! Expiry background task

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{services::Driver, state::Activity};

/// Run revert effects for activities leaving the registry
pub async fn expiry_task(mut expired_rx: mpsc::UnboundedReceiver<Activity>, driver: Driver) {
    info!("Starting expiry task");

    while let Some(activity) = expired_rx.recv().await {
        info!(
            "Activity {} ended ({:?})",
            activity.id(),
            activity.timer.completion()
        );

        if let Err(e) = driver.revert(&activity).await {
            error!("Failed to revert activity {}: {}", activity.id(), e);
        }
        driver.bridge().notify();
    }

    info!("Expiry channel closed, stopping expiry task");
}
