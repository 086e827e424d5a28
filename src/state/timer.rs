//! Countdown timer with an exactly-once completion notification

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, time::Instant};
use tracing::debug;

/// Identity of an activity, shared by its timer and every rendered item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(u64);

impl ActivityId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Running,
    Completed,
}

/// How a timer reached `Completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Completion {
    Expired,
    Finished,
}

type Listener = Box<dyn FnOnce(ActivityId) + Send>;

/// Longest countdown a timer will hold; longer requests are clamped
pub const MAX_COUNTDOWN: Duration = Duration::from_secs(365 * 24 * 60 * 60);

struct TimerInner {
    phase: TimerPhase,
    completion: Option<Completion>,
    /// `None` for a non-counting timer, which only completes through `finish`
    deadline: Option<Instant>,
    owner_hook: Option<Listener>,
    listener: Option<Listener>,
    /// Set once the owner hook has run; listeners registered before that are
    /// picked up by the completing call
    settled: bool,
    notified: bool,
}

struct Shared {
    inner: Mutex<TimerInner>,
    done_tx: watch::Sender<bool>,
}

/// Shared handle to a countdown.
///
/// Clones refer to the same timer. The state machine is `Running -> Completed`
/// and the transition happens once, whether it comes from natural expiry
/// (`poll_expiry`) or from `finish`. On that transition the owner hook runs
/// first, then the `on_finish` listener, so whoever owns the activity has
/// dropped it before any view reacts.
#[derive(Clone)]
pub struct Timer {
    id: ActivityId,
    shared: Arc<Shared>,
}

impl Timer {
    /// Create a running timer. `countdown == None` makes it non-counting.
    pub fn new(id: ActivityId, countdown: Option<Duration>) -> Self {
        let (done_tx, _) = watch::channel(false);
        let inner = TimerInner {
            phase: TimerPhase::Running,
            completion: None,
            deadline: countdown.map(|d| Instant::now() + d.min(MAX_COUNTDOWN)),
            owner_hook: None,
            listener: None,
            settled: false,
            notified: false,
        };

        Self {
            id,
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                done_tx,
            }),
        }
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn phase(&self) -> TimerPhase {
        self.lock().phase
    }

    pub fn completion(&self) -> Option<Completion> {
        self.lock().completion
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == TimerPhase::Completed
    }

    pub fn is_counting(&self) -> bool {
        self.lock().deadline.is_some()
    }

    /// Remaining time at `now`; `None` for a non-counting timer
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        let inner = self.lock();
        let deadline = inner.deadline?;
        match inner.phase {
            TimerPhase::Completed => Some(Duration::ZERO),
            TimerPhase::Running => Some(deadline.saturating_duration_since(now)),
        }
    }

    /// Whole seconds left, rounded up so a fresh 30s timer reads 30
    pub fn remaining_seconds(&self) -> Option<u64> {
        self.remaining_at(Instant::now()).map(|left| {
            let millis = left.as_millis() as u64;
            millis.div_ceil(1000)
        })
    }

    /// Push the deadline back. No-op once completed, when non-counting, or
    /// when the new deadline would exceed `MAX_COUNTDOWN` from now.
    pub fn add_more_time(&self, delta: Duration) -> bool {
        let mut inner = self.lock();
        if inner.phase == TimerPhase::Completed {
            debug!("Ignoring extension of completed timer {}", self.id);
            return false;
        }
        match inner.deadline.as_mut() {
            Some(deadline) => {
                let limit = Instant::now() + MAX_COUNTDOWN;
                match deadline.checked_add(delta).filter(|extended| *extended <= limit) {
                    Some(extended) => {
                        *deadline = extended;
                        true
                    }
                    None => {
                        debug!("Ignoring out-of-range extension of timer {}", self.id);
                        false
                    }
                }
            }
            None => {
                debug!("Ignoring extension of non-counting timer {}", self.id);
                false
            }
        }
    }

    /// Force completion now. Returns false if the timer had already completed.
    pub fn finish(&self) -> bool {
        self.complete(Completion::Finished)
    }

    /// Complete the timer if its deadline has passed at `now`
    pub fn poll_expiry(&self, now: Instant) -> bool {
        let due = {
            let inner = self.lock();
            inner.phase == TimerPhase::Running
                && inner.deadline.is_some_and(|deadline| deadline <= now)
        };
        due && self.complete(Completion::Expired)
    }

    /// Register the completion listener, replacing any earlier one.
    ///
    /// If the timer already completed and nobody was notified yet, the
    /// listener runs immediately on the calling thread.
    pub fn on_finish<F>(&self, listener: F)
    where
        F: FnOnce(ActivityId) + Send + 'static,
    {
        let mut inner = self.lock();
        if !inner.settled {
            inner.listener = Some(Box::new(listener));
        } else if !inner.notified {
            inner.notified = true;
            drop(inner);
            listener(self.id);
        } else {
            debug!("Timer {} already notified its listener", self.id);
        }
    }

    /// Resolves once the timer has completed
    pub async fn completed(&self) {
        let mut rx = self.shared.done_tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|done| *done).await;
    }

    pub(crate) fn set_owner_hook<F>(&self, hook: F)
    where
        F: FnOnce(ActivityId) + Send + 'static,
    {
        self.lock().owner_hook = Some(Box::new(hook));
    }

    fn complete(&self, completion: Completion) -> bool {
        let hook = {
            let mut inner = self.lock();
            if inner.phase == TimerPhase::Completed {
                return false;
            }
            inner.phase = TimerPhase::Completed;
            inner.completion = Some(completion);
            inner.owner_hook.take()
        };

        debug!("Timer {} completed ({:?})", self.id, completion);
        self.shared.done_tx.send_replace(true);

        if let Some(hook) = hook {
            hook(self.id);
        }

        let listener = {
            let mut inner = self.lock();
            inner.settled = true;
            let listener = inner.listener.take();
            if listener.is_some() {
                inner.notified = true;
            }
            listener
        };
        if let Some(listener) = listener {
            listener(self.id);
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, TimerInner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("phase", &inner.phase)
            .field("deadline", &inner.deadline)
            .finish()
    }
}
