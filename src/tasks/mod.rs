//! Background tasks module
//!
//! The driving side runs the countdown and expiry tasks, the rendering side
//! runs the render loop. They talk through the bridge.

pub mod countdown;
pub mod expiry;
pub mod render_loop;

use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::state::{Activity, AppState};

pub use countdown::countdown_task;
pub use expiry::expiry_task;
pub use render_loop::render_loop_task;

/// Spawn the three background tasks for `state`
pub fn spawn_background(
    state: &Arc<AppState>,
    expired_rx: mpsc::UnboundedReceiver<Activity>,
) -> Vec<JoinHandle<()>> {
    // Subscribe before anything can notify.
    let bridge_rx = state.bridge().subscribe();

    vec![
        tokio::spawn(render_loop_task(
            bridge_rx,
            Arc::clone(&state.registry),
            state.render.clone(),
        )),
        tokio::spawn(countdown_task(
            Arc::clone(&state.registry),
            state.bridge().clone(),
            state.settings.tick,
        )),
        tokio::spawn(expiry_task(expired_rx, state.driver.clone())),
    ]
}
