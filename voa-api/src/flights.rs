use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use voa_core::BookingError;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/voos/{partida}", get(departures))
        .route("/voos/{partida}/{chegada}", get(connections))
}

#[derive(Debug, Serialize)]
struct DepartureResponse {
    no_serie: String,
    hora_partida: DateTime<Utc>,
    chegada: String,
}

#[derive(Debug, Serialize)]
struct FlightOptionResponse {
    id: i32,
    no_serie: String,
    hora_partida: DateTime<Utc>,
}

/// GET /voos/{partida}
/// Flights leaving the airport within the next 12 hours, soonest first.
async fn departures(
    State(state): State<AppState>,
    Path(partida): Path<String>,
) -> Result<Json<Vec<DepartureResponse>>, ApiError> {
    state
        .airports
        .get(&partida)
        .await?
        .ok_or(BookingError::NotFound("airport"))?;

    let departures = state.flights.upcoming_departures(&partida).await?;
    tracing::debug!(origin = %partida, count = departures.len(), "listed departures");

    Ok(Json(
        departures
            .into_iter()
            .map(|d| DepartureResponse {
                no_serie: d.aircraft,
                hora_partida: d.departs_at,
                chegada: d.destination,
            })
            .collect(),
    ))
}

/// GET /voos/{partida}/{chegada}
/// Up to three soonest future flights between the two airports that still
/// have at least one unreserved seat.
async fn connections(
    State(state): State<AppState>,
    Path((partida, chegada)): Path<(String, String)>,
) -> Result<Json<Vec<FlightOptionResponse>>, ApiError> {
    if partida == chegada {
        return Err(BookingError::InvalidInput(
            "departure and arrival airports are identical".into(),
        )
        .into());
    }

    let origin = state
        .airports
        .get(&partida)
        .await?
        .ok_or(BookingError::NotFound("airport"))?;
    let destination = state
        .airports
        .get(&chegada)
        .await?
        .ok_or(BookingError::NotFound("airport"))?;

    if origin.city == destination.city {
        return Err(BookingError::InvalidInput(
            "both airports serve the same city".into(),
        )
        .into());
    }

    let options = state
        .flights
        .next_with_free_seats(&partida, &chegada, 3)
        .await?;

    Ok(Json(
        options
            .into_iter()
            .map(|o| FlightOptionResponse {
                id: o.id,
                no_serie: o.aircraft,
                hora_partida: o.departs_at,
            })
            .collect(),
    ))
}
