use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};
use crate::openapi;

/// Lead API and docs routes, without rate limiting.
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // API Documentation
        .route("/docs", get(openapi::serve_swagger_ui))
        .route("/api-docs/openapi.json", get(openapi::serve_openapi_spec))
        // Lead endpoints; static segments win over `:id`
        .route(
            "/api/v1/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        )
        .route("/api/v1/leads/status", post(handlers::update_lead_status))
        .route("/api/v1/leads/import", post(handlers::import_leads))
        .route("/api/v1/leads/import/csv", post(handlers::import_leads_csv))
        .route("/api/v1/leads/export", get(handlers::export_leads_csv))
        .route("/api/v1/leads/cities", get(handlers::lead_cities))
        .route("/api/v1/leads/options", get(handlers::lead_options))
        .route(
            "/api/v1/leads/:id",
            get(handlers::get_lead)
                .patch(handlers::update_lead)
                .delete(handlers::delete_lead),
        )
}

fn assemble(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    // Health check bypasses rate limiting
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Request size limit (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(max_body_bytes))
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Full application router without the per-IP rate limiter.
pub fn build_router(state: Arc<AppState>) -> Router {
    assemble(state, api_routes())
}

/// Application router with per-IP rate limiting on everything but `/health`.
///
/// Must be served with `into_make_service_with_connect_info::<SocketAddr>()`
/// so the limiter can fall back to the peer address.
pub fn build_rate_limited_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(state.config.rate_limit_per_second)
            .burst_size(state.config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
    );

    let api = api_routes().layer(GovernorLayer {
        config: governor_conf,
    });

    Ok(assemble(state, api))
}
