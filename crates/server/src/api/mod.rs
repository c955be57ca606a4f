use std::{path::Path, sync::Arc};

use axum::{
    extract::{State, WebSocketUpgrade},
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shared::domain::ChatEvent;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};

use crate::{app_state::AppState, session::ws_connection};

pub(crate) fn build_router(state: Arc<AppState>, asset_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET])
        .allow_credentials(true);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/events/recent", get(recent_events))
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(asset_dir))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn recent_events(State(state): State<Arc<AppState>>) -> Json<Vec<ChatEvent>> {
    Json(state.room.recent_events())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let room = state.room.clone();
    ws.on_upgrade(move |socket| ws_connection(room, socket))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
