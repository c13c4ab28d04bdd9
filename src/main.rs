//! Pocket Timer - stopwatch and countdown timers with alarm sound and vibration
//!
//! This is the main entry point for the pocket-timer control server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use pocket_timer::{
    api::create_router,
    config::Config,
    services::{default_audio_backend, NoVibrator},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pocket_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pocket-timer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, alarm={}, welcome={}",
        config.host, config.port, config.alarm_sound, config.welcome_sound
    );

    // Mount the screens; alarm sounds start preloading right away
    let state = Arc::new(AppState::new(
        &config,
        default_audio_backend(),
        Arc::new(NoVibrator),
    ));

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timers/{{stopwatch|countdown}}       - Current timer snapshot");
    info!("  POST /timers/{{name}}/toggle               - Start, resume or pause");
    info!("  POST /timers/{{name}}/reset                - Reset to zero");
    info!("  PUT  /timers/countdown/{{minutes|seconds}} - Countdown duration fields");
    info!("  PUT  /timers/stopwatch/alarm-minute       - Stopwatch alarm mark");
    info!("  POST /welcome/play                        - Play the welcome sound");
    info!("  GET  /status                              - Both timers and uptime");
    info!("  GET  /health                              - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
