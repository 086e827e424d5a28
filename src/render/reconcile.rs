//! Reconciliation of an activity batch against the render cache

use tracing::{debug, info};

use crate::state::Activity;
use super::cache::{RenderCache, RenderedActivity, TimeDisplay};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    /// Activities whose timer completed between the batch read and this pass
    pub skipped: usize,
}

/// Map the current batch onto the cache.
///
/// Known ids only get their time refreshed. New ids run first-render side
/// effects, get appended, and register an eviction listener on their timer.
/// Ids absent from the batch are left alone: eviction happens only through
/// timer completion.
pub fn reconcile(cache: &RenderCache, batch: &[Activity]) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for activity in batch {
        let id = activity.id();
        if activity.timer.is_completed() {
            report.skipped += 1;
            continue;
        }

        let time = TimeDisplay::for_timer(activity.timer.is_counting(), activity.seconds);
        if cache.update_time(id, time) {
            report.updated += 1;
            continue;
        }

        if let Some(old_name) = activity.old_name() {
            cache.set_display_name(old_name);
        }

        cache.insert(RenderedActivity {
            id,
            title: activity.title(),
            time,
        });

        // Registered after insertion: a timer that completed meanwhile calls
        // back right away and the item is evicted again.
        let evict = cache.clone();
        activity.timer.on_finish(move |id| {
            evict.evict(id);
        });

        info!("Rendered activity {} ({})", id, time.text());
        report.created += 1;
    }

    debug!("Reconciled batch: {:?}", report);
    report
}
