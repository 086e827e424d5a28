//! Authoritative set of live activities, keyed by timer id

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use super::{
    activity::{Activity, ActivityKind},
    timer::{ActivityId, Timer},
};

/// Outcome of one countdown tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub expired: usize,
    pub live: usize,
}

/// Live activities owned by the driving side.
///
/// Ids come from a monotonic counter and are never handed out twice, so a
/// stale id held by a view can only miss, never hit a newer activity. An
/// activity leaves the registry from inside its timer's completion, before the
/// timer's listener runs, and is then forwarded on the expiry channel.
#[derive(Debug)]
pub struct ActivityRegistry {
    next_id: AtomicU64,
    activities: Mutex<BTreeMap<ActivityId, Activity>>,
    expired_tx: mpsc::UnboundedSender<Activity>,
}

impl ActivityRegistry {
    /// Create a registry together with the receiver of expired activities
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Activity>) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Self {
            next_id: AtomicU64::new(1),
            activities: Mutex::new(BTreeMap::new()),
            expired_tx,
        });
        (registry, expired_rx)
    }

    /// Start tracking a new activity with a fresh timer
    pub fn create(self: &Arc<Self>, countdown: Option<Duration>, kind: ActivityKind) -> Activity {
        let id = ActivityId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let timer = Timer::new(id, countdown);

        let registry = Arc::downgrade(self);
        timer.set_owner_hook(move |id| {
            if let Some(registry) = registry.upgrade() {
                registry.release(id);
            }
        });

        let activity = Activity::new(timer, kind);
        self.entries().insert(id, activity.clone());

        match countdown {
            Some(duration) => info!("Activity {} started with {}s countdown", id, duration.as_secs()),
            None => info!("Activity {} started without countdown", id),
        }
        activity
    }

    pub fn get(&self, id: ActivityId) -> Option<Activity> {
        self.entries().get(&id).cloned()
    }

    /// Current activities in creation order
    pub fn batch(&self) -> Vec<Activity> {
        self.entries().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Add time to a live activity
    pub fn extend(&self, id: ActivityId, delta: Duration) -> Result<Activity> {
        let timer = self.timer(id)?;
        if timer.add_more_time(delta) {
            info!("Activity {} extended by {}s", id, delta.as_secs());
        }

        let mut entries = self.entries();
        let activity = entries
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("activity {}", id)))?;
        activity.refresh_seconds();
        Ok(activity.clone())
    }

    /// Force-finish a live activity's countdown
    pub fn finish(&self, id: ActivityId) -> Result<()> {
        let timer = self.timer(id)?;
        if timer.finish() {
            info!("Activity {} finished on request", id);
        }
        Ok(())
    }

    /// Expire due timers and refresh the display snapshot of the rest
    pub fn tick(&self, now: Instant) -> TickReport {
        let timers: Vec<Timer> = self.entries().values().map(|a| a.timer.clone()).collect();

        let expired = timers.iter().filter(|timer| timer.poll_expiry(now)).count();

        let mut entries = self.entries();
        for activity in entries.values_mut() {
            activity.refresh_seconds();
        }

        TickReport {
            expired,
            live: entries.len(),
        }
    }

    fn timer(&self, id: ActivityId) -> Result<Timer> {
        // Cloned out so completion hooks can re-enter the registry.
        self.entries()
            .get(&id)
            .map(|activity| activity.timer.clone())
            .ok_or_else(|| Error::NotFound(format!("activity {}", id)))
    }

    fn release(&self, id: ActivityId) {
        let Some(mut activity) = self.entries().remove(&id) else {
            debug!("Activity {} already released", id);
            return;
        };
        activity.refresh_seconds();
        info!("Activity {} completed, {} still live", id, self.len());

        if self.expired_tx.send(activity).is_err() {
            warn!("Expiry receiver dropped, activity {} will not be reverted", id);
        }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<ActivityId, Activity>> {
        self.activities.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
