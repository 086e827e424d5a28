//! Profile Autopilot - entry point

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use profile_autopilot::{
    api::create_router,
    config::Config,
    services::{Profile, ProfileService, SimulatedProfileService},
    state::AppState,
    store::{JsonFileBackend, MemoryBackend, StoreBackend},
    tasks::spawn_background,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!("profile_autopilot={},tower_http=info", config.log_level()))
        .init();

    info!("Starting profile-autopilot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, extend_step={}s, tick={}ms",
        config.host, config.port, config.extend_step, config.tick_ms
    );

    let backend: Arc<dyn StoreBackend> = if config.in_memory {
        info!("Templates kept in memory");
        Arc::new(MemoryBackend::new())
    } else {
        info!("Templates stored in {}", config.data_file.display());
        Arc::new(JsonFileBackend::new(&config.data_file))
    };
    let service: Arc<dyn ProfileService> =
        Arc::new(SimulatedProfileService::new(Profile::new(config.persona.clone())));

    // The session check is part of bootstrapping; nothing works without it.
    let (state, expired_rx) = match AppState::bootstrap(service, backend, config.settings()).await {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("Session check failed: {}", e);
            std::process::exit(1);
        }
    };

    let tasks = spawn_background(&state, expired_rx);
    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /group-join               - Join a group, optionally timed");
    info!("  POST   /name-change              - Change the display name, optionally timed");
    info!("  GET    /activities               - Rendered activity list");
    info!("  POST   /activities/:id/extend    - Add time to an activity");
    info!("  POST   /activities/:id/finish    - Finish an activity now");
    info!("  GET    /templates/:kind          - List templates (name|group)");
    info!("  GET    /templates/:kind/:index   - Recall a template");
    info!("  DELETE /templates/:kind/:index   - Remove a template");
    info!("  GET    /profile                  - Profile and header state");
    info!("  GET    /health                   - Health check");

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

    for task in tasks {
        task.abort();
    }
    info!("Server shutdown complete");
    Ok(())
}
