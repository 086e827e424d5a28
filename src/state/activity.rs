//! In-flight operations paired with their timers

use serde::{Deserialize, Serialize};

use super::timer::{ActivityId, Timer};

/// Operation-specific data carried by an activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ActivityKind {
    GroupJoin {
        url: String,
        group_name: String,
    },
    NameChange {
        new_name: String,
        /// Name to put back when the countdown ends
        old_name: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Activity {
    pub timer: Timer,
    /// Display snapshot of the remaining time, refreshed by the countdown task.
    /// `None` means the activity is non-counting.
    pub seconds: Option<u64>,
    pub kind: ActivityKind,
}

impl Activity {
    pub fn new(timer: Timer, kind: ActivityKind) -> Self {
        let seconds = timer.remaining_seconds();
        Self { timer, seconds, kind }
    }

    pub fn id(&self) -> ActivityId {
        self.timer.id()
    }

    pub fn old_name(&self) -> Option<&str> {
        match &self.kind {
            ActivityKind::NameChange { old_name, .. } => old_name.as_deref(),
            ActivityKind::GroupJoin { .. } => None,
        }
    }

    /// Short human label used by the activity list
    pub fn title(&self) -> String {
        match &self.kind {
            ActivityKind::GroupJoin { group_name, .. } => format!("Joined {}", group_name),
            ActivityKind::NameChange { new_name, .. } => format!("Renamed to {}", new_name),
        }
    }

    pub(crate) fn refresh_seconds(&mut self) {
        self.seconds = self.timer.remaining_seconds();
    }
}
