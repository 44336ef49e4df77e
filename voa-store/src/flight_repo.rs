use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use voa_core::error::BookingError;
use voa_core::model::{Departure, Flight, FlightOption};
use voa_core::repository::FlightRepository;

use crate::guards::map_db_err;

pub struct PgFlightRepository {
    pool: PgPool,
}

impl PgFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct FlightRow {
    pub id: i32,
    pub no_serie: String,
    pub hora_partida: DateTime<Utc>,
    pub hora_chegada: DateTime<Utc>,
    pub partida: String,
    pub chegada: String,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            aircraft: row.no_serie,
            departs_at: row.hora_partida,
            arrives_at: row.hora_chegada,
            origin: row.partida,
            destination: row.chegada,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DepartureRow {
    no_serie: String,
    hora_partida: DateTime<Utc>,
    chegada: String,
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    id: i32,
    no_serie: String,
    hora_partida: DateTime<Utc>,
}

#[async_trait]
impl FlightRepository for PgFlightRepository {
    async fn get(&self, id: i32) -> Result<Option<Flight>, BookingError> {
        let row = sqlx::query_as::<_, FlightRow>(
            "SELECT id, no_serie, hora_partida, hora_chegada, partida, chegada \
             FROM voo WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(row.map(Flight::from))
    }

    async fn upcoming_departures(&self, origin: &str) -> Result<Vec<Departure>, BookingError> {
        let rows = sqlx::query_as::<_, DepartureRow>(
            r#"
            SELECT no_serie, hora_partida, chegada
            FROM voo
            WHERE partida = $1
              AND hora_partida >= NOW()
              AND hora_partida <= NOW() + INTERVAL '12 hours'
            ORDER BY hora_partida
            "#,
        )
        .bind(origin)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| Departure {
                aircraft: row.no_serie,
                departs_at: row.hora_partida,
                destination: row.chegada,
            })
            .collect())
    }

    async fn next_with_free_seats(
        &self,
        origin: &str,
        destination: &str,
        limit: i64,
    ) -> Result<Vec<FlightOption>, BookingError> {
        // A seat is free when no ticket on this flight holds it.
        let rows = sqlx::query_as::<_, OptionRow>(
            r#"
            SELECT v.id, v.no_serie, v.hora_partida
            FROM voo v
            WHERE v.partida = $1
              AND v.chegada = $2
              AND v.hora_partida > NOW()
              AND EXISTS (
                  SELECT 1
                  FROM assento a
                  WHERE a.no_serie = v.no_serie
                    AND NOT EXISTS (
                        SELECT 1
                        FROM bilhete b
                        WHERE b.voo_id = v.id
                          AND b.no_serie = a.no_serie
                          AND b.lugar = a.lugar
                    )
              )
            ORDER BY v.hora_partida
            LIMIT $3
            "#,
        )
        .bind(origin)
        .bind(destination)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| FlightOption {
                id: row.id,
                aircraft: row.no_serie,
                departs_at: row.hora_partida,
            })
            .collect())
    }
}
