use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use voa_core::BookingError;

#[derive(Debug)]
pub enum ApiError {
    Booking(BookingError),
    Internal(anyhow::Error),
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        Self::Booking(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn status_for(err: &BookingError) -> StatusCode {
    match err {
        BookingError::InvalidInput(_)
        | BookingError::CapacityExceeded
        | BookingError::SaleAfterDeparture => StatusCode::BAD_REQUEST,
        BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingError::AlreadyCheckedIn
        | BookingError::NoSeatAvailable
        | BookingError::SeatClassMismatch
        | BookingError::AircraftMismatch
        | BookingError::SeatConflict => StatusCode::CONFLICT,
        BookingError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Booking(BookingError::Database(detail)) => {
                tracing::error!(%detail, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                )
            }
            ApiError::Booking(err) => (status_for(&err), err.kind(), err.to_string()),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "kind": kind,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
