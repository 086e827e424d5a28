//! Countdown background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::{bridge::Bridge, state::ActivityRegistry};

/// Drive every registered timer: expire the due ones and refresh display
/// snapshots, then tell the renderer whenever there is something to show.
pub async fn countdown_task(registry: Arc<ActivityRegistry>, bridge: Bridge, tick: Duration) {
    info!("Starting countdown task ({}ms tick)", tick.as_millis());

    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let report = registry.tick(Instant::now());
        if report.expired > 0 {
            debug!("{} activities expired, {} still live", report.expired, report.live);
        }
        if report.live > 0 || report.expired > 0 {
            bridge.notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bridge::BridgeMessage, state::ActivityKind};

    #[tokio::test(start_paused = true)]
    async fn expires_activities_and_notifies() {
        let (registry, mut expired_rx) = ActivityRegistry::new();
        let bridge = Bridge::default();
        let mut rx = bridge.subscribe();
        let activity = registry.create(
            Some(Duration::from_secs(10)),
            ActivityKind::GroupJoin {
                url: "https://steamcommunity.com/groups/foxes".to_string(),
                group_name: "foxes".to_string(),
            },
        );

        let task = tokio::spawn(countdown_task(Arc::clone(&registry), bridge.clone(), Duration::from_secs(1)));

        let expired = expired_rx.recv().await.unwrap();
        assert_eq!(expired.id(), activity.id());
        assert!(registry.is_empty());
        assert_eq!(rx.recv().await, Some(BridgeMessage::ActivityListChanged));

        task.abort();
    }
}
