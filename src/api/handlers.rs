//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::state::{AppState, ScreenError, TimerScreen, TimerSnapshot};
use super::responses::{HealthResponse, MessageResponse, StatusResponse, TextInput, TimerResponse};

type ApiError = (StatusCode, Json<MessageResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn find_screen<'a>(state: &'a AppState, name: &str) -> Result<&'a TimerScreen, ApiError> {
    state.screen(name).ok_or_else(|| {
        warn!("Unknown timer requested: {}", name);
        (
            StatusCode::NOT_FOUND,
            Json(MessageResponse::error(format!("No timer named '{}'", name))),
        )
    })
}

fn screen_error(e: ScreenError) -> ApiError {
    let status = match e {
        ScreenError::Unsupported { .. } => {
            warn!("Rejected intent: {}", e);
            StatusCode::BAD_REQUEST
        }
        ScreenError::Poisoned(_) => {
            error!("{}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(MessageResponse::error(e.to_string())))
}

/// Run an intent against the named screen and record it as the last action
fn apply_intent<F>(
    state: &AppState,
    name: &str,
    action: &str,
    intent: F,
) -> ApiResult<TimerResponse>
where
    F: FnOnce(&TimerScreen) -> Result<TimerSnapshot, ScreenError>,
{
    let screen = find_screen(state, name)?;
    let snapshot = intent(screen).map_err(screen_error)?;
    state.record_action(format!("{}/{}", screen.name(), action));
    Ok(Json(TimerResponse::new(
        format!("{} {} applied", screen.name(), action),
        snapshot,
    )))
}

/// Handle GET /timers/:name - Current render snapshot
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<TimerResponse> {
    let screen = find_screen(&state, &name)?;
    let snapshot = screen.snapshot().map_err(screen_error)?;
    Ok(Json(TimerResponse::new(
        format!("{} timer at {}", screen.name(), snapshot.display),
        snapshot,
    )))
}

/// Handle POST /timers/:name/toggle - Start, resume or pause
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<TimerResponse> {
    let response = apply_intent(&state, &name, "toggle", TimerScreen::on_start_pause)?;
    info!("Toggle endpoint called - {} timer is {}", name, response.status);
    Ok(response)
}

/// Handle POST /timers/:name/reset - Back to zero
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<TimerResponse> {
    let response = apply_intent(&state, &name, "reset", TimerScreen::on_reset)?;
    info!("Reset endpoint called - {} timer reset", name);
    Ok(response)
}

/// Handle PUT /timers/:name/minutes - Countdown minutes field
pub async fn minutes_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(input): Json<TextInput>,
) -> ApiResult<TimerResponse> {
    apply_intent(&state, &name, "minutes", |screen| {
        screen.on_minutes_changed(&input.text)
    })
}

/// Handle PUT /timers/:name/seconds - Countdown seconds field
pub async fn seconds_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(input): Json<TextInput>,
) -> ApiResult<TimerResponse> {
    apply_intent(&state, &name, "seconds", |screen| {
        screen.on_seconds_changed(&input.text)
    })
}

/// Handle PUT /timers/:name/alarm-minute - Stopwatch alarm mark
pub async fn alarm_minute_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(input): Json<TextInput>,
) -> ApiResult<TimerResponse> {
    apply_intent(&state, &name, "alarm-minute", |screen| {
        screen.on_alarm_minute_changed(&input.text)
    })
}

/// Handle POST /welcome/play - Replay the welcome clip
pub async fn welcome_handler(State(state): State<Arc<AppState>>) -> ApiResult<MessageResponse> {
    if !state.play_welcome() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(MessageResponse::error("Welcome sound has been released".to_string())),
        ));
    }

    state.record_action("welcome/play".to_string());
    info!("Welcome endpoint called - playing {}", state.welcome_sound.source());
    Ok(Json(MessageResponse::new(
        "playing",
        "Welcome sound triggered".to_string(),
    )))
}

/// Handle GET /status - Both timers and server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let stopwatch = state.stopwatch.snapshot().map_err(screen_error)?;
    let countdown = state.countdown.snapshot().map_err(screen_error)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        stopwatch,
        countdown,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
