// Gallery Hub Server

use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gallery_hub::{api::create_router, app_state::AppState, config::Config};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gallery_hub=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // SQLite creates the file but not its directory
    if let Some(path) = config.database.url.strip_prefix("sqlite:") {
        let file = path.split('?').next().unwrap_or(path);
        if let Some(dir) = Path::new(file).parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
    }

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;
    let previews = app_state.previews.clone();

    let auth = app_state.auth.clone();
    tokio::spawn(async move {
        let mut sweep = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            sweep.tick().await;
            auth.sweep_expired().await;
        }
    });

    let app = create_router(app_state);

    let addr = config.server_address();
    info!("Gallery Hub starting on http://{}", addr);
    info!("  POST   /api/auth/signup | /api/auth/signin | /api/auth/signout, GET /api/auth/me");
    info!("  GET    /api/profiles/{{id}}, GET /api/gallery/{{kind}}");
    info!("  *      /api/content/{{kind}}/{{id}} (+ /like /download /toc /comments)");
    info!("  POST   /api/delete-account, POST /api/account/delete");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let released = previews.revoke_all();
    info!(released, "Server stopped; released outstanding previews");
    Ok(())
}
