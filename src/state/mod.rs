//! Activity state
//!
//! Timers, the activities that own them, the registry of live activities,
//! and the shared application state.

pub mod activity;
pub mod app_state;
pub mod control;
pub mod registry;
pub mod timer;

pub use activity::{Activity, ActivityKind};
pub use app_state::{AppState, Settings};
pub use control::{ControlFlag, ControlGuard};
pub use registry::{ActivityRegistry, TickReport};
pub use timer::{ActivityId, Completion, Timer, TimerPhase, MAX_COUNTDOWN};
