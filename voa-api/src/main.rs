use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voa_api::{app, middleware::rate_limit::RateLimiter, AppState};
use voa_core::fare::{FareStrategy, RandomFares, RoutePrices, TableFares};
use voa_store::{DbClient, PgAirportRepository, PgBookingRepository, PgFlightRepository};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voa_api=debug,voa_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = voa_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting booking API on port {}", config.server.port);

    let db = DbClient::connect(&config.database)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let fallback = RoutePrices {
        first_cents: config.fares.default_first_cents,
        regular_cents: config.fares.default_regular_cents,
    };
    let fares: Arc<dyn FareStrategy> = match config.fares.strategy.as_str() {
        "random" => Arc::new(RandomFares::default()),
        _ => Arc::new(TableFares::standard_routes(fallback)),
    };

    let state = AppState {
        airports: Arc::new(PgAirportRepository::new(db.pool.clone())),
        flights: Arc::new(PgFlightRepository::new(db.pool.clone())),
        bookings: Arc::new(PgBookingRepository::new(
            db.pool.clone(),
            config.database.lock_timeout_ms,
            config.business_rules.sale_cutoff_minutes,
        )),
        fares,
        limiter: Arc::new(RateLimiter::new(
            config.rate_limit.max_requests,
            Duration::from_secs(config.rate_limit.window_secs),
        )),
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
