use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use engine::GeofenceEngine;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{alerts, health, positions, vehicles, zones};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GeofenceEngine>,
    pub config: Arc<Config>,
}

pub fn create_app(config: Config, engine: Arc<GeofenceEngine>) -> Router {
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let state = AppState {
        engine,
        config: Arc::new(config),
    };

    Router::new()
        // Position ingestion (v1)
        .route("/api/v1/positions", post(positions::ingest_position))
        // Zone management (v1)
        .route(
            "/api/v1/zones",
            put(zones::upsert_zone).get(zones::list_zones),
        )
        .route(
            "/api/v1/zones/:zone_id",
            get(zones::get_zone).delete(zones::delete_zone),
        )
        // Alert lifecycle (v1)
        .route("/api/v1/alerts", get(alerts::list_alerts))
        .route(
            "/api/v1/alerts/:alert_id/acknowledge",
            post(alerts::acknowledge_alert),
        )
        // Vehicle security flag (v1)
        .route(
            "/api/v1/vehicles/:vehicle_id/secured",
            put(vehicles::set_secured),
        )
        // Health and observability
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(trace_id))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
