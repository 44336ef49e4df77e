use async_trait::async_trait;

use crate::error::BookingError;
use crate::model::{
    Airport, Customer, Departure, Flight, FlightOption, SaleReceipt, SeatAssignment, TicketSpec,
};

/// Read-only airport directory.
#[async_trait]
pub trait AirportRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Airport>, BookingError>;

    async fn get(&self, code: &str) -> Result<Option<Airport>, BookingError>;
}

/// Read-only flight queries.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn get(&self, id: i32) -> Result<Option<Flight>, BookingError>;

    /// Flights leaving `origin` within the next 12 hours, soonest first.
    async fn upcoming_departures(&self, origin: &str) -> Result<Vec<Departure>, BookingError>;

    /// Up to `limit` soonest future flights between the two airports that
    /// still have at least one unreserved seat, soonest first.
    async fn next_with_free_seats(
        &self,
        origin: &str,
        destination: &str,
        limit: i64,
    ) -> Result<Vec<FlightOption>, BookingError>;
}

/// The two mutating operations. Each runs as a single transaction: on any
/// error nothing is persisted.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Record a sale of one or more tickets for one flight. Tickets are
    /// created without a seat; seats are bound later by [`check_in`].
    ///
    /// [`check_in`]: BookingRepository::check_in
    async fn create_sale(
        &self,
        flight_id: i32,
        customer: &Customer,
        tickets: &[TicketSpec],
    ) -> Result<SaleReceipt, BookingError>;

    /// Assign one free seat of the ticket's class on the flight's aircraft.
    /// Re-running on an already-assigned ticket fails with
    /// [`BookingError::AlreadyCheckedIn`] and changes nothing.
    async fn check_in(&self, ticket_id: i64) -> Result<SeatAssignment, BookingError>;
}
