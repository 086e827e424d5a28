//! HTTP API module
//!
//! The popup's affordances as endpoints: start operations, extend or finish
//! activities, and save/recall/remove templates.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/group-join", post(group_join_handler))
        .route("/name-change", post(name_change_handler))
        .route("/activities", get(activities_handler))
        .route("/activities/:id/extend", post(extend_handler))
        .route("/activities/:id/finish", post(finish_handler))
        .route("/templates/:kind", get(list_templates_handler))
        .route(
            "/templates/:kind/:index",
            get(recall_template_handler).delete(remove_template_handler),
        )
        .route("/profile", get(profile_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
