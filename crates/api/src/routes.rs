use axum::{extract::State, routing::get, Json, Router};
use core_sim::Position;
use runtime::StatusSnapshot;

use crate::{state::AppState, ws};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/positions", get(positions))
        .route("/ws/events", get(ws::events_socket))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.snapshot())
}

async fn positions(State(state): State<AppState>) -> Json<Vec<Position>> {
    Json(state.snapshot().open_positions)
}
