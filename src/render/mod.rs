//! Rendering side: the activity view and its reconciliation

pub mod cache;
pub mod reconcile;

pub use cache::{RenderCache, RenderSnapshot, RenderedActivity, TimeDisplay};
pub use reconcile::{reconcile, ReconcileReport};
