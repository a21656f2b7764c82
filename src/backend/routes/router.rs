/**
 * Router Configuration
 *
 * Combines the public and protected API routes into one Axum router.
 *
 * # Layers (outermost first)
 *
 * 1. `TraceLayer` - request spans
 * 2. `CorsLayer` - origins from `ALLOWED_ORIGINS`
 * 3. Auth middleware - protected routes only
 * 4. Room guard - attendee-only room routes
 *
 * Unknown paths fall through to `not_found_fallback`.
 */

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::error::conversion::not_found_fallback;
use crate::backend::routes::api_routes::{configure_protected_routes, configure_public_routes};
use crate::backend::server::state::AppState;
use crate::shared::config::AppConfig;

/// CORS policy for the browser client
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid origin in ALLOWED_ORIGINS: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let public = configure_public_routes(Router::new());
    let protected = configure_protected_routes(app_state.clone());

    public
        .merge(protected)
        .fallback(not_found_fallback)
        .layer(cors_layer(&app_state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
