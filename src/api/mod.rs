//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.
//! A UI shell renders the snapshots and forwards user intents here.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers/:name", get(timer_handler))
        .route("/timers/:name/toggle", post(toggle_handler))
        .route("/timers/:name/reset", post(reset_handler))
        .route("/timers/:name/minutes", put(minutes_handler))
        .route("/timers/:name/seconds", put(seconds_handler))
        .route("/timers/:name/alarm-minute", put(alarm_minute_handler))
        .route("/welcome/play", post(welcome_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
