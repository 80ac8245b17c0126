use axum::{extract::State, routing::get, Json, Router};
use travel_core::Trip;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/trips", get(list_trips))
}

/// GET /api/trips
async fn list_trips(State(state): State<AppState>) -> Result<Json<Vec<Trip>>, AppError> {
    let trips = state.repo.list_trips().await?;
    tracing::debug!(count = trips.len(), "Listed trips");
    Ok(Json(trips))
}
