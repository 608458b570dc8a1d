use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::models::AppointmentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Shop,
    Service,
    Staff,
    Appointment,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Shop => "Shop",
            ResourceKind::Service => "Service",
            ResourceKind::Staff => "Staff member",
            ResourceKind::Appointment => "Appointment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(ResourceKind),

    #[error("Time slot not available")]
    SlotUnavailable,

    #[error("Cannot transition appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ResponseError for BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::Validation(_) | BookingError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::SlotUnavailable => StatusCode::CONFLICT,
            BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            BookingError::Database(err) => {
                log::error!("Database error: {err}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            BookingError::Validation("missing field".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BookingError::NotFound(ResourceKind::Service).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BookingError::SlotUnavailable.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            BookingError::InvalidTransition {
                from: AppointmentStatus::Completed,
                to: AppointmentStatus::Confirmed,
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
