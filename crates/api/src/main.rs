use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use engine::{GeofenceEngine, LogNotifier, NotificationDispatcher, WebhookNotifier};
use fleetguard_api::{app, config::Config, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();

    info!("Starting FleetGuard API v{}", env!("CARGO_PKG_VERSION"));

    let notifier: Arc<dyn NotificationDispatcher> = match &config.notifications.webhook_url {
        Some(url) if !url.is_empty() => {
            info!(url = %url, "Dispatching alerts to webhook");
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        _ => Arc::new(LogNotifier::new()),
    };

    let engine = Arc::new(GeofenceEngine::new(config.engine.clone(), notifier));
    let app = app::create_app(config.clone(), engine);

    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
