// HTTP and WebSocket APIs

pub mod websocket;
pub mod world;

pub use websocket::{create_ws_router, ws_handler};
pub use world::{create_world_router, AppState};

use crate::config::WorldSyncConfig;
use crate::engine::SyncEngine;
use axum::{response::Redirect, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};

/// Full application router: world API, subscriber socket, static front end
pub fn create_app(engine: Arc<SyncEngine>, config: &WorldSyncConfig) -> Router {
    let state = Arc::new(AppState {
        engine,
        max_body_bytes: config.api.max_body_bytes,
    });

    let app = Router::new()
        .route("/", get(|| async { Redirect::temporary("/static/index.html") }))
        .nest_service("/static", ServeDir::new(&config.server.static_dir))
        .merge(create_world_router(Arc::clone(&state)))
        .merge(create_ws_router(state));

    if config.server.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
