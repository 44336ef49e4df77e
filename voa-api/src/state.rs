use std::sync::Arc;
use voa_core::fare::FareStrategy;
use voa_core::repository::{AirportRepository, BookingRepository, FlightRepository};

use crate::middleware::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub airports: Arc<dyn AirportRepository>,
    pub flights: Arc<dyn FlightRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub fares: Arc<dyn FareStrategy>,
    pub limiter: Arc<RateLimiter>,
}
