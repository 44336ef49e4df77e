use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: i32,
    /// Serial number of the aircraft flying this leg.
    pub aircraft: String,
    pub departs_at: DateTime<Utc>,
    pub arrives_at: DateTime<Utc>,
    pub origin: String,
    pub destination: String,
}

/// One entry of the "departures from airport X" listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departure {
    pub aircraft: String,
    pub departs_at: DateTime<Utc>,
    pub destination: String,
}

/// One entry of the "next flights between X and Y with free seats" listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub id: i32,
    pub aircraft: String,
    pub departs_at: DateTime<Utc>,
}

/// Buyer identity for a sale. `counter` is the airport code of the selling
/// desk; an absent counter means an online sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub nif: String,
    pub counter: Option<String>,
}

/// One ticket to create within a sale, price already quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSpec {
    pub passenger: String,
    pub first_class: bool,
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub reservation_code: i32,
    /// Ticket ids in the order they were requested.
    pub ticket_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub ticket_id: i64,
    pub seat: String,
    pub aircraft: String,
}
