use crate::engine::{EngineStats, SyncEngine};
use crate::state::{Record, World};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared application state for the world API
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub max_body_bytes: usize,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create router with world and entity endpoints
pub fn create_world_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/world", get(get_world).post(get_world))
        .route(
            "/entity/:entity",
            get(get_entity).put(replace_entity).post(merge_entity),
        )
        .route("/clear", get(clear_world).post(clear_world))
        .route("/api/stats", get(get_stats))
        .with_state(state)
}

/// GET|POST /world - Full world
async fn get_world(State(state): State<Arc<AppState>>) -> Json<World> {
    Json(state.engine.world())
}

/// GET /entity/:entity - One record, `{}` if absent
async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
) -> Json<Record> {
    Json(state.engine.store.get(&entity))
}

/// PUT /entity/:entity - Replace the whole record
async fn replace_entity(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
    body: Bytes,
) -> Result<Json<Record>, AppError> {
    let record = parse_record(&body, state.max_body_bytes)?;

    info!(entity = %entity, attributes = record.len(), "Replacing entity");
    Ok(Json(state.engine.store.set(&entity, record)))
}

/// POST /entity/:entity - Merge attributes one at a time, return the full record
async fn merge_entity(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
    body: Bytes,
) -> Result<Json<Record>, AppError> {
    let attributes = parse_record(&body, state.max_body_bytes)?;

    debug!(entity = %entity, attributes = attributes.len(), "Merging into entity");
    let store = &state.engine.store;
    for (key, value) in attributes {
        store.update(&entity, &key, value);
    }

    Ok(Json(store.get(&entity)))
}

/// GET|POST /clear - Empty the world. Subscribers are not notified.
async fn clear_world(State(state): State<Arc<AppState>>) -> Json<World> {
    state.engine.store.clear();
    Json(state.engine.world())
}

/// GET /api/stats - Engine counters
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<EngineStats> {
    Json(state.engine.stats())
}

/// Body must be a JSON object within the size limit
fn parse_record(body: &Bytes, limit: usize) -> Result<Record, AppError> {
    if body.len() > limit {
        return Err(AppError::PayloadTooLarge);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::ValidationError(e.to_string()))?;

    match value {
        Value::Object(record) => Ok(record),
        _ => Err(AppError::ValidationError(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Application error types
#[derive(Debug)]
enum AppError {
    ValidationError(String),
    PayloadTooLarge,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
