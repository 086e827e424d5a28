//! Process-level helpers

pub mod signals;

pub use signals::shutdown_signal;
