//! Shared state behind the HTTP surface

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    bridge::Bridge,
    error::Result,
    render::RenderCache,
    services::{Driver, ProfileService},
    store::{IndexedStore, StoreBackend, TemplateRepository},
};
use super::{Activity, ActivityRegistry, ControlFlag};

/// Tunables taken from the command line
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Time added by "extend" when the request names none
    pub extend_step: Duration,
    /// Countdown tick period
    pub tick: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extend_step: Duration::from_secs(10),
            tick: Duration::from_secs(1),
        }
    }
}

/// Everything the handlers and background tasks share
pub struct AppState {
    pub driver: Driver,
    pub registry: Arc<ActivityRegistry>,
    pub templates: TemplateRepository,
    pub render: RenderCache,
    pub settings: Settings,
    pub group_control: ControlFlag,
    pub name_control: ControlFlag,
    pub start_time: Instant,
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Check the session, then wire registry, bridge, driver, store and view.
    ///
    /// Also returns the receiver of expired activities, to be handed to the
    /// expiry task.
    pub async fn bootstrap(
        service: Arc<dyn ProfileService>,
        backend: Arc<dyn StoreBackend>,
        settings: Settings,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<Activity>)> {
        let profile = service.check_session().await?;
        info!("Signed in as {} ({})", profile.persona_name, profile.id64);

        let (registry, expired_rx) = ActivityRegistry::new();
        let render = RenderCache::new(Some(profile.persona_name.clone()));
        let driver = Driver::new(Arc::clone(&registry), Bridge::default(), service, profile);
        let templates = TemplateRepository::new(Arc::new(IndexedStore::new(backend)));

        let state = Arc::new(Self {
            driver,
            registry,
            templates,
            render,
            settings,
            group_control: ControlFlag::new("group-join"),
            name_control: ControlFlag::new("name-change"),
            start_time: Instant::now(),
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        });
        Ok((state, expired_rx))
    }

    pub fn bridge(&self) -> &Bridge {
        self.driver.bridge()
    }

    /// Remember the last user-triggered action for the status endpoint
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
