use async_trait::async_trait;
use sqlx::PgPool;
use voa_core::error::BookingError;
use voa_core::model::Airport;
use voa_core::repository::AirportRepository;

use crate::guards::map_db_err;

pub struct PgAirportRepository {
    pool: PgPool,
}

impl PgAirportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    codigo: String,
    nome: String,
    cidade: String,
    pais: String,
}

impl From<AirportRow> for Airport {
    fn from(row: AirportRow) -> Self {
        Airport {
            code: row.codigo,
            name: row.nome,
            city: row.cidade,
            country: row.pais,
        }
    }
}

#[async_trait]
impl AirportRepository for PgAirportRepository {
    async fn list(&self) -> Result<Vec<Airport>, BookingError> {
        let rows = sqlx::query_as::<_, AirportRow>(
            "SELECT codigo, nome, cidade, pais FROM aeroporto ORDER BY nome",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Airport::from).collect())
    }

    async fn get(&self, code: &str) -> Result<Option<Airport>, BookingError> {
        let row = sqlx::query_as::<_, AirportRow>(
            "SELECT codigo, nome, cidade, pais FROM aeroporto WHERE codigo = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(row.map(Airport::from))
    }
}
