//! Consistency guards: named invariant checks executed inside the same
//! transaction as the mutation they protect, under the locks taken by the
//! caller. A guard failure rolls the whole transaction back.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Postgres, Transaction};
use voa_core::BookingError;

/// G3: a sale must precede departure, minus the configured boarding cutoff.
pub fn sale_before_departure(
    sold_at: DateTime<Utc>,
    departs_at: DateTime<Utc>,
    cutoff: Duration,
) -> Result<(), BookingError> {
    if sold_at + cutoff >= departs_at {
        return Err(BookingError::SaleAfterDeparture);
    }
    Ok(())
}

/// G2: per flight and class, tickets sold plus the tickets being added must
/// not exceed the seats of that class on the flight's aircraft. The caller
/// holds the flight row lock, so the counts cannot move under us.
pub async fn class_capacity(
    tx: &mut Transaction<'_, Postgres>,
    flight_id: i32,
    aircraft: &str,
    first_class: bool,
    requested: i64,
) -> Result<(), BookingError> {
    let seats: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM assento WHERE no_serie = $1 AND prim_classe = $2",
    )
    .bind(aircraft)
    .bind(first_class)
    .fetch_one(&mut **tx)
    .await
    .map_err(map_db_err)?;

    let sold: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bilhete WHERE voo_id = $1 AND prim_classe = $2",
    )
    .bind(flight_id)
    .bind(first_class)
    .fetch_one(&mut **tx)
    .await
    .map_err(map_db_err)?;

    if sold + requested > seats {
        tracing::warn!(
            flight_id,
            first_class,
            sold,
            requested,
            seats,
            "sale rejected: class capacity exceeded"
        );
        return Err(BookingError::CapacityExceeded);
    }
    Ok(())
}

/// G1: re-read a just-written seat assignment and verify the seat exists on
/// the ticket's aircraft, the classes match, and the aircraft is the one
/// flying the ticket's flight.
pub async fn seat_assignment_valid(
    tx: &mut Transaction<'_, Postgres>,
    ticket_id: i64,
) -> Result<(), BookingError> {
    #[derive(sqlx::FromRow)]
    struct AssignmentRow {
        ticket_aircraft: Option<String>,
        ticket_class: bool,
        flight_aircraft: String,
        seat_class: Option<bool>,
    }

    let row = sqlx::query_as::<_, AssignmentRow>(
        r#"
        SELECT b.no_serie AS ticket_aircraft,
               b.prim_classe AS ticket_class,
               v.no_serie AS flight_aircraft,
               a.prim_classe AS seat_class
        FROM bilhete b
        JOIN voo v ON v.id = b.voo_id
        LEFT JOIN assento a ON a.no_serie = b.no_serie AND a.lugar = b.lugar
        WHERE b.id = $1
        "#,
    )
    .bind(ticket_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(map_db_err)?;

    if row.ticket_aircraft.as_deref() != Some(row.flight_aircraft.as_str()) {
        return Err(BookingError::AircraftMismatch);
    }
    match row.seat_class {
        // seat not found on the ticket's aircraft
        None => Err(BookingError::AircraftMismatch),
        Some(seat_class) if seat_class != row.ticket_class => {
            Err(BookingError::SeatClassMismatch)
        }
        Some(_) => Ok(()),
    }
}

/// Classify a driver error by SQLSTATE and constraint name only; error
/// message text is never inspected.
pub fn map_db_err(err: sqlx::Error) -> BookingError {
    if matches!(err, sqlx::Error::PoolTimedOut) {
        return BookingError::Unavailable;
    }

    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            // lock_not_available: SET LOCAL lock_timeout expired
            Some("55P03") => return BookingError::Unavailable,
            Some("23505") if db.constraint() == Some("bilhete_voo_assento_key") => {
                return BookingError::SeatConflict;
            }
            Some("23503") if db.constraint() == Some("venda_balcao_fkey") => {
                return BookingError::InvalidInput("unknown sales counter".into());
            }
            _ => {}
        }
    }

    tracing::error!(error = %err, "unexpected database error");
    BookingError::Database(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sale_before_departure_accepts_earlier_sale() {
        let departs = Utc.with_ymd_and_hms(2026, 8, 6, 18, 0, 0).unwrap();
        let sold = departs - Duration::hours(2);
        assert!(sale_before_departure(sold, departs, Duration::zero()).is_ok());
    }

    #[test]
    fn test_sale_before_departure_rejects_departed_flight() {
        let departs = Utc.with_ymd_and_hms(2026, 8, 6, 18, 0, 0).unwrap();
        let sold = departs + Duration::minutes(1);
        assert_eq!(
            sale_before_departure(sold, departs, Duration::zero()),
            Err(BookingError::SaleAfterDeparture)
        );
    }

    #[test]
    fn test_sale_before_departure_honours_cutoff() {
        let departs = Utc.with_ymd_and_hms(2026, 8, 6, 18, 0, 0).unwrap();
        let sold = departs - Duration::minutes(20);
        // 30-minute boarding cutoff closes the sale even though the flight
        // has not departed yet
        assert_eq!(
            sale_before_departure(sold, departs, Duration::minutes(30)),
            Err(BookingError::SaleAfterDeparture)
        );
        assert!(sale_before_departure(sold, departs, Duration::minutes(10)).is_ok());
    }
}
