use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use voa_core::error::BookingError;
use voa_core::model::{Customer, SaleReceipt, SeatAssignment, TicketSpec};
use voa_core::repository::BookingRepository;

use crate::flight_repo::FlightRow;
use crate::guards::{self, map_db_err};

pub struct PgBookingRepository {
    pool: PgPool,
    lock_timeout_ms: u64,
    sale_cutoff: Duration,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool, lock_timeout_ms: u64, sale_cutoff_minutes: i64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
            sale_cutoff: Duration::minutes(sale_cutoff_minutes),
        }
    }

    /// Bound lock waits so a contended flight fails fast with a retryable
    /// error instead of parking the request indefinitely.
    async fn set_lock_timeout(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<(), BookingError> {
        // SET LOCAL takes no bind parameters; the value is our own config.
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut **tx)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_sale(
        &self,
        flight_id: i32,
        customer: &Customer,
        tickets: &[TicketSpec],
    ) -> Result<SaleReceipt, BookingError> {
        if tickets.is_empty() {
            return Err(BookingError::InvalidInput("no tickets requested".into()));
        }

        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        self.set_lock_timeout(&mut tx).await?;

        // Serialization point: the flight row lock orders concurrent sales
        // for the same flight, so the capacity guard sees settled counts.
        let flight = sqlx::query_as::<_, FlightRow>(
            "SELECT id, no_serie, hora_partida, hora_chegada, partida, chegada \
             FROM voo WHERE id = $1 FOR UPDATE",
        )
        .bind(flight_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or(BookingError::NotFound("flight"))?;

        let now = Utc::now();
        guards::sale_before_departure(now, flight.hora_partida, self.sale_cutoff)?;

        let first = tickets.iter().filter(|t| t.first_class).count() as i64;
        let regular = tickets.len() as i64 - first;
        for (first_class, requested) in [(true, first), (false, regular)] {
            if requested > 0 {
                guards::class_capacity(&mut tx, flight.id, &flight.no_serie, first_class, requested)
                    .await?;
            }
        }

        let reservation_code: i32 = sqlx::query_scalar(
            "INSERT INTO venda (nif_cliente, balcao, hora) VALUES ($1, $2, $3) \
             RETURNING codigo_reserva",
        )
        .bind(&customer.nif)
        .bind(customer.counter.as_deref())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        let mut ticket_ids = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO bilhete (voo_id, codigo_reserva, nome_passageiro, preco, prim_classe) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(flight.id)
            .bind(reservation_code)
            .bind(&ticket.passenger)
            .bind(ticket.price_cents)
            .bind(ticket.first_class)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;
            ticket_ids.push(id);
        }

        tx.commit().await.map_err(map_db_err)?;

        info!(
            reservation_code,
            flight_id = flight.id,
            tickets = ticket_ids.len(),
            "sale committed"
        );

        Ok(SaleReceipt {
            reservation_code,
            ticket_ids,
        })
    }

    async fn check_in(&self, ticket_id: i64) -> Result<SeatAssignment, BookingError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        self.set_lock_timeout(&mut tx).await?;

        #[derive(sqlx::FromRow)]
        struct TicketRow {
            id: i64,
            voo_id: i32,
            prim_classe: bool,
            lugar: Option<String>,
            aircraft: String,
        }

        let ticket = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT b.id, b.voo_id, b.prim_classe, b.lugar, v.no_serie AS aircraft
            FROM bilhete b
            JOIN voo v ON v.id = b.voo_id
            WHERE b.id = $1
            FOR UPDATE OF b
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or(BookingError::NotFound("ticket"))?;

        if ticket.lugar.is_some() {
            return Err(BookingError::AlreadyCheckedIn);
        }

        // Claim one free seat of the right class. SKIP LOCKED makes racing
        // check-ins claim disjoint seats instead of blocking on each other.
        let seat: Option<String> = sqlx::query_scalar(
            r#"
            SELECT a.lugar
            FROM assento a
            WHERE a.no_serie = $1
              AND a.prim_classe = $2
              AND NOT EXISTS (
                  SELECT 1
                  FROM bilhete b
                  WHERE b.voo_id = $3
                    AND b.no_serie = a.no_serie
                    AND b.lugar = a.lugar
              )
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(&ticket.aircraft)
        .bind(ticket.prim_classe)
        .bind(ticket.voo_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?;

        let seat = seat.ok_or(BookingError::NoSeatAvailable)?;

        sqlx::query("UPDATE bilhete SET lugar = $1, no_serie = $2 WHERE id = $3")
            .bind(&seat)
            .bind(&ticket.aircraft)
            .bind(ticket.id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        // G1 re-validation at write time.
        guards::seat_assignment_valid(&mut tx, ticket.id).await?;

        tx.commit().await.map_err(map_db_err)?;

        info!(ticket_id = ticket.id, seat = %seat, "check-in committed");

        Ok(SeatAssignment {
            ticket_id: ticket.id,
            seat,
            aircraft: ticket.aircraft,
        })
    }
}
