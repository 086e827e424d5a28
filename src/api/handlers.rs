//! HTTP endpoint handlers

use std::{sync::Arc, time::Duration};
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::Result,
    services::{GroupJoinRequest, NameChangeRequest},
    state::{ActivityId, AppState},
    store::{compose_name, strip_present_name, GroupTemplate, NameTemplate, Template, TemplateKind},
};
use super::responses::{
    ActivitiesResponse, ActivityResponse, ExtendRequest, HealthResponse, OperationResponse,
    ProfileResponse, RecallResponse, RemoveTemplateRequest, TemplateSave, TemplatesResponse,
};

#[derive(Debug, Clone, Deserialize)]
pub struct GroupJoinForm {
    pub url: String,
    #[serde(default)]
    pub time: u64,
    /// Save the submitted values as a group template once joined
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameChangeForm {
    /// Full name to set
    pub name: String,
    #[serde(default)]
    pub time: u64,
    /// Whether `name` extends the current persona name
    #[serde(default)]
    pub plus: bool,
    #[serde(default)]
    pub save: bool,
}

/// Handle POST /group-join
pub async fn group_join_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<GroupJoinForm>,
) -> Result<Json<OperationResponse>> {
    let _busy = state.group_control.try_acquire()?;

    let outcome = state
        .driver
        .start_group_join(GroupJoinRequest {
            url: form.url,
            time: form.time,
        })
        .await?;

    let saved = if form.save {
        let template = Template::Group(GroupTemplate {
            group_name: outcome.group_name.clone(),
            url: outcome.url.clone(),
            time: outcome.time,
        });
        save_template(&state, &template).await
    } else {
        TemplateSave::Skipped
    };

    state.record_action("group-join");
    info!("Group join endpoint called - joined {}", outcome.group_name);
    Ok(Json(OperationResponse::started(
        format!("Joined {}", outcome.group_name),
        &outcome.activity,
        saved,
    )))
}

/// Handle POST /name-change
pub async fn name_change_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<NameChangeForm>,
) -> Result<Json<OperationResponse>> {
    let _busy = state.name_control.try_acquire()?;

    let base_name = state
        .render
        .display_name()
        .unwrap_or_else(|| state.driver.profile().persona_name);

    let outcome = state
        .driver
        .start_name_change(NameChangeRequest {
            name: form.name.clone(),
            time: form.time,
        })
        .await?;

    // A permanent rename becomes the new base name; a timed one keeps the
    // header on the name it will return to.
    if outcome.activity.old_name().is_none() {
        state.render.set_display_name(outcome.profile.persona_name.clone());
    }

    let saved = if form.save {
        let template = Template::Name(NameTemplate {
            name: strip_present_name(&form.name, &base_name).to_string(),
            time: outcome.time,
            plus: form.plus,
        });
        save_template(&state, &template).await
    } else {
        TemplateSave::Skipped
    };

    state.record_action("name-change");
    info!("Name change endpoint called - now {}", outcome.profile.persona_name);
    Ok(Json(OperationResponse::started(
        format!("Renamed to {}", outcome.profile.persona_name),
        &outcome.activity,
        saved,
    )))
}

/// The operation already ran by the time this is called, so a store failure
/// is reported alongside the started activity instead of failing the request.
async fn save_template(state: &AppState, template: &Template) -> TemplateSave {
    match state.templates.save(template).await {
        Ok(index) => TemplateSave::Saved(index),
        Err(e) => {
            warn!("Failed to save {} template: {}", template.kind(), e);
            TemplateSave::Failed(e.to_string())
        }
    }
}

/// Handle GET /activities
pub async fn activities_handler(State(state): State<Arc<AppState>>) -> Json<ActivitiesResponse> {
    let snapshot = state.render.snapshot();
    Json(ActivitiesResponse {
        activities: snapshot.activities,
        has_active_items: snapshot.has_active_items,
        live: state.registry.len(),
    })
}

/// Handle POST /activities/:id/extend
pub async fn extend_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    body: Option<Json<ExtendRequest>>,
) -> Result<Json<ActivityResponse>> {
    let seconds = body
        .and_then(|Json(request)| request.seconds)
        .map(Duration::from_secs)
        .unwrap_or(state.settings.extend_step);

    let activity = state.driver.extend(ActivityId::new(id), seconds)?;
    state.record_action("extend");
    Ok(Json(ActivityResponse::ok(&activity)))
}

/// Handle POST /activities/:id/finish
pub async fn finish_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ActivitiesResponse>> {
    state.driver.finish(ActivityId::new(id))?;
    state.record_action("finish");

    let snapshot = state.render.snapshot();
    Ok(Json(ActivitiesResponse {
        activities: snapshot.activities,
        has_active_items: snapshot.has_active_items,
        live: state.registry.len(),
    }))
}

/// Handle GET /templates/:kind
pub async fn list_templates_handler(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<TemplateKind>,
) -> Result<Json<TemplatesResponse>> {
    let templates = state.templates.list(kind).await?;
    Ok(Json(TemplatesResponse { templates }))
}

/// Handle GET /templates/:kind/:index - recall a template into the form
pub async fn recall_template_handler(
    State(state): State<Arc<AppState>>,
    Path((kind, index)): Path<(TemplateKind, usize)>,
) -> Result<Json<RecallResponse>> {
    let template = state.templates.recall(kind, index).await?;

    let field_value = match &template {
        Template::Name(tpl) => {
            let persona = state
                .render
                .display_name()
                .unwrap_or_else(|| state.driver.profile().persona_name);
            compose_name(tpl, &persona)
        }
        Template::Group(tpl) => tpl.url.clone(),
    };

    Ok(Json(RecallResponse {
        has_time: template.time() != 0,
        field_value,
        template,
    }))
}

/// Handle DELETE /templates/:kind/:index
pub async fn remove_template_handler(
    State(state): State<Arc<AppState>>,
    Path((kind, index)): Path<(TemplateKind, usize)>,
    body: Option<Json<RemoveTemplateRequest>>,
) -> Result<Json<TemplatesResponse>> {
    let expected = body.and_then(|Json(request)| request.expected);

    let templates = match expected {
        Some(expected) => state.templates.remove_checked(kind, index, &expected).await?,
        None => state.templates.remove(kind, index).await?,
    };

    state.record_action("remove-template");
    Ok(Json(TemplatesResponse { templates }))
}

/// Handle GET /profile
pub async fn profile_handler(State(state): State<Arc<AppState>>) -> Json<ProfileResponse> {
    let (last_action, last_action_time) = state.get_last_action();
    Json(ProfileResponse {
        profile: state.driver.profile(),
        display_name: state.render.display_name(),
        has_active_items: state.render.has_active_items(),
        uptime: state.get_uptime(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
