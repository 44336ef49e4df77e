use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use voa_core::model::{Customer, TicketSpec};
use voa_core::BookingError;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/compra/{voo}", post(purchase))
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    // defaulted so that missing fields report invalid_input instead of a
    // deserialization rejection
    #[serde(default)]
    pub nif: String,
    /// Selling counter (airport code); absent for online sales.
    #[serde(default)]
    pub balcao: Option<String>,
    #[serde(default)]
    pub bilhetes: Vec<TicketRequest>,
}

#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub prim_classe: bool,
}

#[derive(Debug, Serialize)]
struct PurchaseResponse {
    codigo_reserva: i32,
    bilhetes: Vec<i64>,
}

fn validate(req: &PurchaseRequest) -> Result<(), BookingError> {
    if req.nif.len() != 9 || !req.nif.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BookingError::InvalidInput(
            "nif must be exactly 9 digits".into(),
        ));
    }
    if req.bilhetes.is_empty() {
        return Err(BookingError::InvalidInput(
            "at least one ticket is required".into(),
        ));
    }
    if req.bilhetes.iter().any(|b| b.nome.trim().is_empty()) {
        return Err(BookingError::InvalidInput(
            "passenger names must not be empty".into(),
        ));
    }
    if let Some(balcao) = &req.balcao {
        if balcao.len() != 3 {
            return Err(BookingError::InvalidInput(
                "balcao must be a 3-letter airport code".into(),
            ));
        }
    }
    Ok(())
}

/// POST /compra/{voo}
/// Sell one or more tickets for the flight, seats unassigned until check-in.
async fn purchase(
    State(state): State<AppState>,
    Path(voo): Path<i32>,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ApiError> {
    validate(&req)?;

    let flight = state
        .flights
        .get(voo)
        .await?
        .ok_or(BookingError::NotFound("flight"))?;

    let tickets: Vec<TicketSpec> = req
        .bilhetes
        .iter()
        .map(|b| TicketSpec {
            passenger: b.nome.trim().to_string(),
            first_class: b.prim_classe,
            price_cents: state
                .fares
                .quote(&flight.origin, &flight.destination, b.prim_classe),
        })
        .collect();

    let customer = Customer {
        nif: req.nif,
        counter: req.balcao,
    };

    let receipt = state.bookings.create_sale(voo, &customer, &tickets).await?;

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            codigo_reserva: receipt.reservation_code,
            bilhetes: receipt.ticket_ids,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(nif: &str, names: &[&str]) -> PurchaseRequest {
        PurchaseRequest {
            nif: nif.into(),
            balcao: None,
            bilhetes: names
                .iter()
                .map(|n| TicketRequest {
                    nome: (*n).into(),
                    prim_classe: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        assert!(validate(&request("123456789", &["Ana Silva"])).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_nif() {
        assert!(validate(&request("", &["Ana"])).is_err());
        assert!(validate(&request("12345678", &["Ana"])).is_err());
        assert!(validate(&request("12345678X", &["Ana"])).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_tickets() {
        assert!(validate(&request("123456789", &[])).is_err());
        assert!(validate(&request("123456789", &["  "])).is_err());
    }
}
