/**
 * Gateway Routes
 *
 * - `GET /`     - WebSocket endpoint (allow-listed `Origin` required)
 * - `GET /ping` - liveness probe
 */

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Query, State,
    },
    http::{
        header::{AUTHORIZATION, ORIGIN},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use super::socket::handle_socket;
use super::state::GatewayState;
use crate::backend::auth::sessions::bearer_token;

/// Browsers cannot set headers on a WebSocket handshake, so the token may
/// also travel as `?token=`
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ping", get(ping))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ping() -> &'static str {
    "pong"
}

/// Bearer token from the handshake, falling back to the query string
pub fn handshake_token(headers: &HeaderMap, query: TokenQuery) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
        .or(query.token)
}

async fn ws_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    match origin {
        Some(origin) if state.config.is_origin_allowed(origin.trim_end_matches('/')) => {}
        _ => {
            tracing::warn!("[Gateway] Origin {:?} not allowed", origin);
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        }
    }

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return rejection.into_response(),
    };

    let token = handshake_token(&headers, query);
    upgrade.on_upgrade(move |socket| handle_socket(socket, state, token))
}
