//! Profile service collaborator
//!
//! The remote side (session checks, group membership, display name changes)
//! sits behind [`ProfileService`]. [`SimulatedProfileService`] keeps the
//! profile in memory and is what the binary and the tests run against.

use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};

/// Public profile data shown in the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub persona_name: String,
    pub id64: String,
    /// One of offline, online, in-game
    pub online_state: String,
    pub state_message: String,
    pub avatar: String,
}

impl Profile {
    pub fn new(persona_name: impl Into<String>) -> Self {
        Self {
            persona_name: persona_name.into(),
            id64: "76561197960265728".to_string(),
            online_state: "online".to_string(),
            state_message: "Online".to_string(),
            avatar: String::new(),
        }
    }
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Verify the session and fetch the signed-in profile
    async fn check_session(&self) -> Result<Profile>;

    /// Join the group at `url`; returns the group's display name
    async fn join_group(&self, url: &str) -> Result<String>;

    async fn leave_group(&self, url: &str) -> Result<()>;

    /// Change the display name; returns the updated profile
    async fn change_name(&self, new_name: &str) -> Result<Profile>;
}

#[derive(Debug)]
pub struct SimulatedProfileService {
    profile: Mutex<Profile>,
    groups: Mutex<BTreeSet<String>>,
    latency: Duration,
}

impl SimulatedProfileService {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile: Mutex::new(profile),
            groups: Mutex::new(BTreeSet::new()),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn profile(&self) -> Profile {
        lock(&self.profile).clone()
    }

    /// Urls of the groups currently joined
    pub fn groups(&self) -> Vec<String> {
        lock(&self.groups).iter().cloned().collect()
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ProfileService for SimulatedProfileService {
    async fn check_session(&self) -> Result<Profile> {
        self.round_trip().await;
        Ok(self.profile())
    }

    async fn join_group(&self, url: &str) -> Result<String> {
        self.round_trip().await;
        let name = group_name_from_url(url)?;
        lock(&self.groups).insert(url.to_string());
        info!("Joined group {} ({})", name, url);
        Ok(name)
    }

    async fn leave_group(&self, url: &str) -> Result<()> {
        self.round_trip().await;
        if !lock(&self.groups).remove(url) {
            return Err(Error::OperationFailed(format!("not a member of {}", url)));
        }
        info!("Left group {}", url);
        Ok(())
    }

    async fn change_name(&self, new_name: &str) -> Result<Profile> {
        self.round_trip().await;
        if new_name.trim().is_empty() {
            return Err(Error::OperationFailed("display name cannot be blank".to_string()));
        }

        let mut profile = lock(&self.profile);
        debug!("Renaming {} to {}", profile.persona_name, new_name);
        profile.persona_name = new_name.to_string();
        Ok(profile.clone())
    }
}

/// Last path segment of a group url, e.g. `foxes` for `/groups/foxes`
pub fn group_name_from_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| Error::OperationFailed(format!("invalid group url {}: {}", raw, e)))?;
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| Error::OperationFailed(format!("{} does not name a group", raw)))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
