//! Render cache: the rendering side's view of live activities

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use serde::Serialize;
use tracing::debug;

use crate::state::ActivityId;

/// Remaining-time text of a rendered item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "seconds", rename_all = "lowercase")]
pub enum TimeDisplay {
    Counting(u64),
    /// No countdown, shown as a fixed state rather than a ticking value
    Static,
}

impl TimeDisplay {
    /// A counting timer always ticks, even at zero while awaiting its expiry
    /// pass; only non-counting timers are static.
    pub fn for_timer(counting: bool, seconds: Option<u64>) -> Self {
        match (counting, seconds) {
            (true, seconds) => Self::Counting(seconds.unwrap_or(0)),
            (false, _) => Self::Static,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Counting(seconds) => format!("{}s", seconds),
            Self::Static => "until finished".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedActivity {
    pub id: ActivityId,
    pub title: String,
    pub time: TimeDisplay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderSnapshot {
    pub activities: Vec<RenderedActivity>,
    pub has_active_items: bool,
    pub display_name: Option<String>,
}

#[derive(Debug, Default)]
struct View {
    /// Kept in append order, one entry per id
    items: Vec<RenderedActivity>,
    has_active_items: bool,
    display_name: Option<String>,
}

/// Handle to the rendered activity list.
///
/// Clones share the same view; eviction closures registered on timers hold a
/// clone. The "has active items" badge is recomputed on every insert and
/// eviction.
#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    view: Arc<Mutex<View>>,
}

impl RenderCache {
    pub fn new(display_name: Option<String>) -> Self {
        let cache = Self::default();
        cache.view().display_name = display_name;
        cache
    }

    pub fn contains(&self, id: ActivityId) -> bool {
        self.view().items.iter().any(|item| item.id == id)
    }

    /// Update the time of an already rendered item; false if absent
    pub fn update_time(&self, id: ActivityId, time: TimeDisplay) -> bool {
        let mut view = self.view();
        match view.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.time = time;
                true
            }
            None => false,
        }
    }

    /// Append an item unless its id is already rendered
    pub fn insert(&self, item: RenderedActivity) -> bool {
        let mut view = self.view();
        if view.items.iter().any(|existing| existing.id == item.id) {
            return false;
        }
        view.items.push(item);
        view.has_active_items = true;
        true
    }

    pub fn evict(&self, id: ActivityId) -> bool {
        let mut view = self.view();
        let before = view.items.len();
        view.items.retain(|item| item.id != id);
        let removed = view.items.len() != before;
        view.has_active_items = !view.items.is_empty();

        if removed {
            debug!("Evicted rendered activity {}, {} left", id, view.items.len());
        }
        removed
    }

    pub fn has_active_items(&self) -> bool {
        self.view().has_active_items
    }

    pub fn len(&self) -> usize {
        self.view().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view().items.is_empty()
    }

    pub fn items(&self) -> Vec<RenderedActivity> {
        self.view().items.clone()
    }

    pub fn display_name(&self) -> Option<String> {
        self.view().display_name.clone()
    }

    pub fn set_display_name(&self, name: impl Into<String>) {
        self.view().display_name = Some(name.into());
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let view = self.view();
        RenderSnapshot {
            activities: view.items.clone(),
            has_active_items: view.has_active_items,
            display_name: view.display_name.clone(),
        }
    }

    fn view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
