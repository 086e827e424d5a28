//! Driving operations: run a profile action and track it as an activity

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::{
    bridge::Bridge,
    error::{Error, Result},
    state::{Activity, ActivityId, ActivityKind, ActivityRegistry, MAX_COUNTDOWN},
};
use super::profile::{Profile, ProfileService};

/// Shortest countdown accepted; 0 means "no countdown"
pub const MIN_COUNTDOWN_SECONDS: u64 = 10;

/// Longest countdown or single extension accepted
pub const MAX_COUNTDOWN_SECONDS: u64 = MAX_COUNTDOWN.as_secs();

/// Check a requested countdown: 0 is non-counting, 1 to 9 is rejected
pub fn validate_time(seconds: u64) -> Result<Option<Duration>> {
    match seconds {
        0 => Ok(None),
        s if s < MIN_COUNTDOWN_SECONDS => Err(Error::Validation(format!(
            "time must be 0 or at least {} seconds, got {}",
            MIN_COUNTDOWN_SECONDS, s
        ))),
        s if s > MAX_COUNTDOWN_SECONDS => Err(Error::Validation(format!(
            "time must be at most {} seconds, got {}",
            MAX_COUNTDOWN_SECONDS, s
        ))),
        s => Ok(Some(Duration::from_secs(s))),
    }
}

/// Canonical group url: https by default, no query or fragment, no trailing slash
pub fn normalize_group_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Validation("group url is required".to_string()));
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    let mut url = Url::parse(&with_scheme)
        .map_err(|e| Error::Validation(format!("invalid group url {}: {}", raw, e)))?;
    if url.host_str().is_none() {
        return Err(Error::Validation(format!("group url {} has no host", raw)));
    }

    url.set_query(None);
    url.set_fragment(None);
    let mut normalized = url.to_string();
    while normalized.ends_with('/') {
        normalized.pop();
    }
    Ok(normalized)
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupJoinRequest {
    pub url: String,
    #[serde(default)]
    pub time: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameChangeRequest {
    pub name: String,
    #[serde(default)]
    pub time: u64,
}

#[derive(Debug, Clone)]
pub struct GroupJoinOutcome {
    pub activity: Activity,
    pub group_name: String,
    pub url: String,
    pub time: u64,
}

#[derive(Debug, Clone)]
pub struct NameChangeOutcome {
    pub activity: Activity,
    pub profile: Profile,
    pub previous_name: String,
    pub time: u64,
}

/// Entry point of the driving side.
///
/// Owns the registry and the bridge, and knows the profile as last reported
/// by the service. Returned futures resolve once the remote call is done and
/// the activity is registered.
#[derive(Clone)]
pub struct Driver {
    registry: Arc<ActivityRegistry>,
    bridge: Bridge,
    service: Arc<dyn ProfileService>,
    profile: Arc<RwLock<Profile>>,
}

impl Driver {
    pub fn new(
        registry: Arc<ActivityRegistry>,
        bridge: Bridge,
        service: Arc<dyn ProfileService>,
        profile: Profile,
    ) -> Self {
        Self {
            registry,
            bridge,
            service,
            profile: Arc::new(RwLock::new(profile)),
        }
    }

    pub fn registry(&self) -> &Arc<ActivityRegistry> {
        &self.registry
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn profile(&self) -> Profile {
        self.profile.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub async fn start_group_join(&self, request: GroupJoinRequest) -> Result<GroupJoinOutcome> {
        let countdown = validate_time(request.time)?;
        let url = normalize_group_url(&request.url)?;

        let group_name = self.service.join_group(&url).await?;
        let activity = self.registry.create(
            countdown,
            ActivityKind::GroupJoin {
                url: url.clone(),
                group_name: group_name.clone(),
            },
        );
        self.bridge.notify();

        info!("Group join {} running as activity {}", url, activity.id());
        Ok(GroupJoinOutcome {
            activity,
            group_name,
            url,
            time: request.time,
        })
    }

    pub async fn start_name_change(&self, request: NameChangeRequest) -> Result<NameChangeOutcome> {
        let countdown = validate_time(request.time)?;
        if request.name.trim().is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }

        let previous_name = self.profile().persona_name;
        let profile = self.service.change_name(&request.name).await?;
        self.set_profile(profile.clone());

        let activity = self.registry.create(
            countdown,
            ActivityKind::NameChange {
                new_name: profile.persona_name.clone(),
                old_name: countdown.map(|_| previous_name.clone()),
            },
        );
        self.bridge.notify();

        info!(
            "Name change {} -> {} running as activity {}",
            previous_name,
            profile.persona_name,
            activity.id()
        );
        Ok(NameChangeOutcome {
            activity,
            profile,
            previous_name,
            time: request.time,
        })
    }

    pub fn extend(&self, id: ActivityId, delta: Duration) -> Result<Activity> {
        if delta > MAX_COUNTDOWN {
            return Err(Error::Validation(format!(
                "extension must be at most {} seconds, got {}",
                MAX_COUNTDOWN_SECONDS,
                delta.as_secs()
            )));
        }
        let activity = self.registry.extend(id, delta)?;
        self.bridge.notify();
        Ok(activity)
    }

    /// Finish the countdown early. The remote operation itself is not aborted.
    pub fn finish(&self, id: ActivityId) -> Result<()> {
        self.registry.finish(id)?;
        self.bridge.notify();
        Ok(())
    }

    /// Undo what a completed counting activity did
    pub async fn revert(&self, activity: &Activity) -> Result<()> {
        if !activity.timer.is_counting() {
            return Ok(());
        }

        match &activity.kind {
            ActivityKind::GroupJoin { url, group_name } => {
                info!("Leaving {} after activity {}", group_name, activity.id());
                self.service.leave_group(url).await
            }
            ActivityKind::NameChange { old_name: Some(old_name), .. } => {
                info!("Restoring name {} after activity {}", old_name, activity.id());
                let profile = self.service.change_name(old_name).await?;
                self.set_profile(profile);
                Ok(())
            }
            ActivityKind::NameChange { old_name: None, .. } => {
                warn!("Activity {} has no name to restore", activity.id());
                Ok(())
            }
        }
    }

    fn set_profile(&self, profile: Profile) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = profile;
    }
}
