use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_airports))
}

#[derive(Debug, Serialize)]
struct AirportResponse {
    nome: String,
    cidade: String,
}

/// GET /
/// List all airports.
async fn list_airports(
    State(state): State<AppState>,
) -> Result<Json<Vec<AirportResponse>>, ApiError> {
    let airports = state.airports.list().await?;
    tracing::debug!(count = airports.len(), "listed airports");

    Ok(Json(
        airports
            .into_iter()
            .map(|a| AirportResponse {
                nome: a.name,
                cidade: a.city,
            })
            .collect(),
    ))
}
