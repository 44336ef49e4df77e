//! In-memory implementation of the repository traits, enforcing the same
//! invariants as the Postgres layer. Backs the API tests and local
//! development without a database; a single mutex makes every operation
//! atomic.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use voa_core::error::BookingError;
use voa_core::model::{
    Airport, Customer, Departure, Flight, FlightOption, SaleReceipt, SeatAssignment, TicketSpec,
};
use voa_core::repository::{AirportRepository, BookingRepository, FlightRepository};

#[derive(Debug, Clone)]
struct Seat {
    aircraft: String,
    label: String,
    first_class: bool,
}

// Row mirrors carry the full record even where only a few fields are read.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct Sale {
    code: i32,
    nif: String,
    counter: Option<String>,
    sold_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct Ticket {
    id: i64,
    flight_id: i32,
    reservation_code: i32,
    passenger: String,
    price_cents: i64,
    first_class: bool,
    seat: Option<String>,
    aircraft: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    airports: Vec<Airport>,
    seats: Vec<Seat>,
    flights: Vec<Flight>,
    sales: Vec<Sale>,
    tickets: Vec<Ticket>,
    next_reservation: i32,
    next_ticket: i64,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    sale_cutoff: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_reservation: 1,
                next_ticket: 1,
                ..Inner::default()
            }),
            sale_cutoff: Duration::zero(),
        }
    }

    pub fn with_sale_cutoff(mut self, minutes: i64) -> Self {
        self.sale_cutoff = Duration::minutes(minutes);
        self
    }

    // ------------------------------------------------------------------
    // Seeding (stands in for externally loaded data)
    // ------------------------------------------------------------------

    pub fn add_airport(&self, code: &str, name: &str, city: &str, country: &str) {
        self.inner.lock().unwrap().airports.push(Airport {
            code: code.into(),
            name: name.into(),
            city: city.into(),
            country: country.into(),
        });
    }

    /// Register an aircraft by its seat map: (seat label, first class).
    pub fn add_aircraft(&self, serial: &str, seats: &[(&str, bool)]) {
        let mut inner = self.inner.lock().unwrap();
        for (label, first_class) in seats {
            inner.seats.push(Seat {
                aircraft: serial.into(),
                label: (*label).into(),
                first_class: *first_class,
            });
        }
    }

    pub fn add_flight(
        &self,
        id: i32,
        aircraft: &str,
        origin: &str,
        destination: &str,
        departs_at: DateTime<Utc>,
        arrives_at: DateTime<Utc>,
    ) {
        self.inner.lock().unwrap().flights.push(Flight {
            id,
            aircraft: aircraft.into(),
            departs_at,
            arrives_at,
            origin: origin.into(),
            destination: destination.into(),
        });
    }

    /// Insert a pre-existing ticket directly, bypassing the sale guards the
    /// way an external seed load does. Returns the ticket id.
    pub fn add_seeded_ticket(
        &self,
        flight_id: i32,
        passenger: &str,
        first_class: bool,
        seat: Option<&str>,
    ) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let aircraft = inner
            .flights
            .iter()
            .find(|f| f.id == flight_id)
            .map(|f| f.aircraft.clone())
            .expect("seeded ticket references a missing flight");
        let code = inner.next_reservation;
        inner.next_reservation += 1;
        inner.sales.push(Sale {
            code,
            nif: "000000000".into(),
            counter: None,
            sold_at: Utc::now() - Duration::days(1),
        });
        let id = inner.next_ticket;
        inner.next_ticket += 1;
        inner.tickets.push(Ticket {
            id,
            flight_id,
            reservation_code: code,
            passenger: passenger.into(),
            price_cents: 10_000,
            first_class,
            seat: seat.map(Into::into),
            aircraft: seat.map(|_| aircraft),
        });
        id
    }

    fn seat_is_taken(inner: &Inner, flight_id: i32, aircraft: &str, label: &str) -> bool {
        inner.tickets.iter().any(|t| {
            t.flight_id == flight_id
                && t.aircraft.as_deref() == Some(aircraft)
                && t.seat.as_deref() == Some(label)
        })
    }

    fn has_free_seat(inner: &Inner, flight: &Flight) -> bool {
        inner
            .seats
            .iter()
            .filter(|s| s.aircraft == flight.aircraft)
            .any(|s| !Self::seat_is_taken(inner, flight.id, &s.aircraft, &s.label))
    }
}

#[async_trait]
impl AirportRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Airport>, BookingError> {
        let mut airports = self.inner.lock().unwrap().airports.clone();
        airports.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(airports)
    }

    async fn get(&self, code: &str) -> Result<Option<Airport>, BookingError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .airports
            .iter()
            .find(|a| a.code == code)
            .cloned())
    }
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn get(&self, id: i32) -> Result<Option<Flight>, BookingError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .flights
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }

    async fn upcoming_departures(&self, origin: &str) -> Result<Vec<Departure>, BookingError> {
        let now = Utc::now();
        let horizon = now + Duration::hours(12);
        let mut departures: Vec<Departure> = self
            .inner
            .lock()
            .unwrap()
            .flights
            .iter()
            .filter(|f| f.origin == origin && f.departs_at >= now && f.departs_at <= horizon)
            .map(|f| Departure {
                aircraft: f.aircraft.clone(),
                departs_at: f.departs_at,
                destination: f.destination.clone(),
            })
            .collect();
        departures.sort_by_key(|d| d.departs_at);
        Ok(departures)
    }

    async fn next_with_free_seats(
        &self,
        origin: &str,
        destination: &str,
        limit: i64,
    ) -> Result<Vec<FlightOption>, BookingError> {
        let now = Utc::now();
        let inner = self.inner.lock().unwrap();
        let mut options: Vec<(DateTime<Utc>, FlightOption)> = inner
            .flights
            .iter()
            .filter(|f| f.origin == origin && f.destination == destination && f.departs_at > now)
            .filter(|f| Self::has_free_seat(&inner, f))
            .map(|f| {
                (
                    f.departs_at,
                    FlightOption {
                        id: f.id,
                        aircraft: f.aircraft.clone(),
                        departs_at: f.departs_at,
                    },
                )
            })
            .collect();
        options.sort_by_key(|(at, _)| *at);
        Ok(options
            .into_iter()
            .take(limit as usize)
            .map(|(_, option)| option)
            .collect())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_sale(
        &self,
        flight_id: i32,
        customer: &Customer,
        tickets: &[TicketSpec],
    ) -> Result<SaleReceipt, BookingError> {
        if tickets.is_empty() {
            return Err(BookingError::InvalidInput("no tickets requested".into()));
        }

        let mut inner = self.inner.lock().unwrap();

        let flight = inner
            .flights
            .iter()
            .find(|f| f.id == flight_id)
            .cloned()
            .ok_or(BookingError::NotFound("flight"))?;

        let now = Utc::now();
        if now + self.sale_cutoff >= flight.departs_at {
            return Err(BookingError::SaleAfterDeparture);
        }

        // class capacity, same counting as the storage guard
        for first_class in [true, false] {
            let requested = tickets.iter().filter(|t| t.first_class == first_class).count();
            if requested == 0 {
                continue;
            }
            let seats = inner
                .seats
                .iter()
                .filter(|s| s.aircraft == flight.aircraft && s.first_class == first_class)
                .count();
            let sold = inner
                .tickets
                .iter()
                .filter(|t| t.flight_id == flight.id && t.first_class == first_class)
                .count();
            if sold + requested > seats {
                return Err(BookingError::CapacityExceeded);
            }
        }

        let reservation_code = inner.next_reservation;
        inner.next_reservation += 1;
        inner.sales.push(Sale {
            code: reservation_code,
            nif: customer.nif.clone(),
            counter: customer.counter.clone(),
            sold_at: now,
        });

        let mut ticket_ids = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let id = inner.next_ticket;
            inner.next_ticket += 1;
            inner.tickets.push(Ticket {
                id,
                flight_id: flight.id,
                reservation_code,
                passenger: ticket.passenger.clone(),
                price_cents: ticket.price_cents,
                first_class: ticket.first_class,
                seat: None,
                aircraft: None,
            });
            ticket_ids.push(id);
        }

        Ok(SaleReceipt {
            reservation_code,
            ticket_ids,
        })
    }

    async fn check_in(&self, ticket_id: i64) -> Result<SeatAssignment, BookingError> {
        let mut inner = self.inner.lock().unwrap();

        let (flight_id, first_class, already_assigned) = {
            let ticket = inner
                .tickets
                .iter()
                .find(|t| t.id == ticket_id)
                .ok_or(BookingError::NotFound("ticket"))?;
            (ticket.flight_id, ticket.first_class, ticket.seat.is_some())
        };
        if already_assigned {
            return Err(BookingError::AlreadyCheckedIn);
        }

        let aircraft = inner
            .flights
            .iter()
            .find(|f| f.id == flight_id)
            .map(|f| f.aircraft.clone())
            .ok_or(BookingError::NotFound("flight"))?;

        let seat = inner
            .seats
            .iter()
            .filter(|s| s.aircraft == aircraft && s.first_class == first_class)
            .find(|s| !Self::seat_is_taken(&inner, flight_id, &s.aircraft, &s.label))
            .map(|s| s.label.clone())
            .ok_or(BookingError::NoSeatAvailable)?;

        let ticket = inner
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .expect("ticket vanished under the store lock");
        ticket.seat = Some(seat.clone());
        ticket.aircraft = Some(aircraft.clone());

        Ok(SeatAssignment {
            ticket_id,
            seat,
            aircraft,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn customer() -> Customer {
        Customer {
            nif: "123456789".into(),
            counter: None,
        }
    }

    fn regular(passenger: &str) -> TicketSpec {
        TicketSpec {
            passenger: passenger.into(),
            first_class: false,
            price_cents: 7_500,
        }
    }

    fn first(passenger: &str) -> TicketSpec {
        TicketSpec {
            passenger: passenger.into(),
            first_class: true,
            price_cents: 18_000,
        }
    }

    /// LIS -> OPO in two hours, 2 first-class and 4 regular seats.
    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_airport("LIS", "Humberto Delgado", "Lisboa", "Portugal");
        store.add_airport("OPO", "Francisco Sa Carneiro", "Porto", "Portugal");
        store.add_aircraft(
            "CS-TVA",
            &[
                ("1A", true),
                ("1B", true),
                ("2A", false),
                ("2B", false),
                ("2C", false),
                ("2D", false),
            ],
        );
        let departs = Utc::now() + Duration::hours(2);
        store.add_flight(100, "CS-TVA", "LIS", "OPO", departs, departs + Duration::hours(1));
        store
    }

    #[tokio::test]
    async fn test_sale_creates_all_tickets() {
        let store = seeded_store();
        let receipt = store
            .create_sale(100, &customer(), &[regular("Ana"), regular("Rui"), first("Eva")])
            .await
            .unwrap();
        assert_eq!(receipt.ticket_ids.len(), 3);

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.sales.len(), 1);
        assert_eq!(inner.tickets.len(), 3);
        assert!(inner.tickets.iter().all(|t| t.seat.is_none()));
    }

    #[tokio::test]
    async fn test_sale_unknown_flight() {
        let store = seeded_store();
        let err = store
            .create_sale(999, &customer(), &[regular("Ana")])
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::NotFound("flight"));
    }

    #[tokio::test]
    async fn test_sale_over_capacity_persists_nothing() {
        let store = seeded_store();
        // 2 first-class seats; ask for 3 in one sale
        let err = store
            .create_sale(100, &customer(), &[first("A"), first("B"), first("C")])
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::CapacityExceeded);

        let inner = store.inner.lock().unwrap();
        assert!(inner.sales.is_empty(), "failed sale must not persist a venda row");
        assert!(inner.tickets.is_empty(), "failed sale must not persist tickets");
    }

    #[tokio::test]
    async fn test_sequential_sales_fill_capacity_exactly() {
        let store = seeded_store();
        for name in ["A", "B", "C", "D"] {
            store.create_sale(100, &customer(), &[regular(name)]).await.unwrap();
        }
        let err = store
            .create_sale(100, &customer(), &[regular("E")])
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::CapacityExceeded);
    }

    #[tokio::test]
    async fn test_sale_after_departure() {
        let store = seeded_store();
        let departed = Utc::now() - Duration::hours(1);
        store.add_flight(200, "CS-TVA", "OPO", "LIS", departed, departed + Duration::hours(1));
        let err = store
            .create_sale(200, &customer(), &[regular("Ana")])
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::SaleAfterDeparture);
        assert!(store.inner.lock().unwrap().sales.is_empty());
    }

    #[tokio::test]
    async fn test_sale_cutoff_blocks_near_departure() {
        let store = seeded_store().with_sale_cutoff(180);
        // flight 100 departs in 2 hours; a 3-hour cutoff closes it
        let err = store
            .create_sale(100, &customer(), &[regular("Ana")])
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::SaleAfterDeparture);
    }

    #[tokio::test]
    async fn test_checkin_assigns_matching_class_seat() {
        let store = seeded_store();
        let receipt = store
            .create_sale(100, &customer(), &[regular("Ana")])
            .await
            .unwrap();
        let assignment = store.check_in(receipt.ticket_ids[0]).await.unwrap();
        assert_eq!(assignment.aircraft, "CS-TVA");
        assert!(["2A", "2B", "2C", "2D"].contains(&assignment.seat.as_str()));
    }

    #[tokio::test]
    async fn test_checkin_twice_is_rejected_and_seat_unchanged() {
        let store = seeded_store();
        let receipt = store
            .create_sale(100, &customer(), &[regular("Ana")])
            .await
            .unwrap();
        let ticket_id = receipt.ticket_ids[0];
        let assignment = store.check_in(ticket_id).await.unwrap();

        let err = store.check_in(ticket_id).await.unwrap_err();
        assert_eq!(err, BookingError::AlreadyCheckedIn);

        let inner = store.inner.lock().unwrap();
        let ticket = inner.tickets.iter().find(|t| t.id == ticket_id).unwrap();
        assert_eq!(ticket.seat.as_deref(), Some(assignment.seat.as_str()));
    }

    #[tokio::test]
    async fn test_checkin_unknown_ticket() {
        let store = seeded_store();
        let err = store.check_in(424242).await.unwrap_err();
        assert_eq!(err, BookingError::NotFound("ticket"));
    }

    #[tokio::test]
    async fn test_checkin_no_seat_available_on_oversold_flight() {
        // Externally seeded data may oversell a class; check-in must then
        // run out of seats instead of double-assigning.
        let store = seeded_store();
        store.add_seeded_ticket(100, "A", true, Some("1A"));
        store.add_seeded_ticket(100, "B", true, Some("1B"));
        let late = store.add_seeded_ticket(100, "C", true, None);

        let err = store.check_in(late).await.unwrap_err();
        assert_eq!(err, BookingError::NoSeatAvailable);
    }

    #[tokio::test]
    async fn test_concurrent_checkins_never_share_a_seat() {
        let store = Arc::new(seeded_store());
        let receipt = store
            .create_sale(100, &customer(), &[regular("A"), regular("B"), regular("C"), regular("D")])
            .await
            .unwrap();

        let mut handles = Vec::new();
        for ticket_id in receipt.ticket_ids.clone() {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.check_in(ticket_id).await }));
        }

        let mut seats = HashSet::new();
        for handle in handles {
            let assignment = handle.await.unwrap().unwrap();
            assert!(
                seats.insert(assignment.seat.clone()),
                "seat {} assigned twice",
                assignment.seat
            );
        }
        assert_eq!(seats.len(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_race_for_last_seat_has_one_winner() {
        let store = Arc::new(seeded_store());
        // leave exactly one free first-class seat, with several unassigned
        // tickets racing for it
        store.add_seeded_ticket(100, "Early", true, Some("1A"));
        let racers: Vec<i64> = (0..4)
            .map(|i| store.add_seeded_ticket(100, &format!("P{i}"), true, None))
            .collect();

        let mut handles = Vec::new();
        for ticket_id in racers {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.check_in(ticket_id).await }));
        }

        let mut winners = 0;
        let mut losers = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(assignment) => {
                    assert_eq!(assignment.seat, "1B");
                    winners += 1;
                }
                Err(BookingError::NoSeatAvailable) => losers += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(losers, 3);
    }

    #[tokio::test]
    async fn test_flight_listings() {
        let store = seeded_store();
        let departures = store.upcoming_departures("LIS").await.unwrap();
        assert_eq!(departures.len(), 1);
        assert_eq!(departures[0].destination, "OPO");

        // far-future flight is outside the 12-hour window
        let far = Utc::now() + Duration::hours(20);
        store.add_flight(300, "CS-TVA", "LIS", "OPO", far, far + Duration::hours(1));
        assert_eq!(store.upcoming_departures("LIS").await.unwrap().len(), 1);

        let options = store.next_with_free_seats("LIS", "OPO", 3).await.unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].id, 100);
    }

    #[tokio::test]
    async fn test_fully_reserved_flight_drops_out_of_listing() {
        let store = seeded_store();
        for (seat, first_class) in [
            ("1A", true),
            ("1B", true),
            ("2A", false),
            ("2B", false),
            ("2C", false),
            ("2D", false),
        ] {
            store.add_seeded_ticket(100, seat, first_class, Some(seat));
        }
        let options = store.next_with_free_seats("LIS", "OPO", 3).await.unwrap();
        assert!(options.is_empty());
    }
}
