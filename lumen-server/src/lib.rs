mod config;
mod room;
mod signaling;

pub use config::*;
pub use room::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use lumen_core::utils::SIGNALING_PATH;
use tower_http::cors::{Any, CorsLayer};

/// HTTP surface of the relay: the signaling socket plus a liveness probe.
pub fn build_router(relay: Relay) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(SIGNALING_PATH, get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(relay)
}

async fn health() -> &'static str {
    "ok"
}
