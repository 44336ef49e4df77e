pub mod airport_repo;
pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod flight_repo;
pub mod guards;
pub mod memory;

pub use airport_repo::PgAirportRepository;
pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use flight_repo::PgFlightRepository;
pub use memory::MemoryStore;
