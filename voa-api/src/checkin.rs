use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/checkin/{bilhete}", put(check_in))
}

#[derive(Debug, Serialize)]
struct CheckinResponse {
    bilhete: i64,
    lugar: String,
    no_serie: String,
}

/// PUT /checkin/{bilhete}
/// Assign a free seat of the ticket's class on the flight's aircraft.
async fn check_in(
    State(state): State<AppState>,
    Path(bilhete): Path<i64>,
) -> Result<Json<CheckinResponse>, ApiError> {
    let assignment = state.bookings.check_in(bilhete).await?;

    Ok(Json(CheckinResponse {
        bilhete: assignment.ticket_id,
        lugar: assignment.seat,
        no_serie: assignment.aircraft,
    }))
}
