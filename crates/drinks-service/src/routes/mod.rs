//! HTTP routes for the drinks service.
//!
//! Defines the Axum router, the permission table and application state.

use crate::auth::{JwksClient, JwtValidator};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{guarded, http_metrics_middleware};
use crate::repositories::DrinkRepository;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use crate::observability::metrics::init_metrics_recorder;

/// Permission required by `GET /drinks-detail`.
pub const PERMISSION_GET_DRINKS_DETAIL: &str = "get:drinks-detail";
/// Permission required by `POST /drinks`.
pub const PERMISSION_POST_DRINKS: &str = "post:drinks";
/// Permission required by `PATCH /drinks/:id`.
pub const PERMISSION_PATCH_DRINKS: &str = "patch:drinks";
/// Permission required by `DELETE /drinks/:id`.
pub const PERMISSION_DELETE_DRINKS: &str = "delete:drinks";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Drink persistence.
    pub repository: Arc<dyn DrinkRepository>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health`, `/ready` - liveness and readiness probes
/// - `/metrics` - Prometheus scrape endpoint
/// - `/drinks`, `/drinks-detail`, `/drinks/:id` - drink CRUD, guarded per
///   method by the permissions above
/// - TraceLayer, 30 second timeout, CORS and HTTP metrics on every route
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let jwks_client = Arc::new(JwksClient::with_ttl(
        state.config.auth_jwks_url.clone(),
        Duration::from_secs(state.config.jwks_cache_ttl_seconds),
    ));
    let jwt_validator = Arc::new(JwtValidator::new(
        jwks_client,
        state.config.auth_issuer.clone(),
        state.config.auth_audience.clone(),
        state.config.jwt_clock_skew_seconds,
    ));

    let cors = cors_layer(&state.config.cors_allowed_origins);

    let drink_routes = Router::new()
        .route(
            "/drinks",
            get(handlers::list_drinks).merge(guarded(
                jwt_validator.clone(),
                PERMISSION_POST_DRINKS,
                post(handlers::create_drink),
            )),
        )
        .route(
            "/drinks-detail",
            guarded(
                jwt_validator.clone(),
                PERMISSION_GET_DRINKS_DETAIL,
                get(handlers::list_drinks_detail),
            ),
        )
        .route(
            "/drinks/:id",
            guarded(
                jwt_validator.clone(),
                PERMISSION_PATCH_DRINKS,
                patch(handlers::update_drink),
            )
            .merge(guarded(
                jwt_validator,
                PERMISSION_DELETE_DRINKS,
                delete(handlers::delete_drink),
            )),
        )
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. CorsLayer - answers preflight requests before they reach the guard
    // 4. http_metrics_middleware - records ALL responses (outermost)
    drink_routes
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// CORS policy. An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(target: "drinks.routes", origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
