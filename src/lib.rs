//! Profile Autopilot - timed profile activities with a live activity view
//!
//! A driving side runs profile operations (joining a group, changing the
//! display name) as activities with optional countdowns. A rendering side
//! keeps one rendered item per live activity, reconciled from bridge
//! notifications, and offers extend/finish affordances plus saved templates.

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod render;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
pub use utils::signals::shutdown_signal;
