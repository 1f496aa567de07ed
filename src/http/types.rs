use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::messages::Outcome;

/// Body shared by every response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(outcome: Outcome, data: T) -> Self {
        Self { status: outcome.status().as_u16(), message: outcome.message().to_string(), data }
    }
}

pub fn send_success<T: Serialize>(outcome: Outcome, data: T) -> Response {
    (outcome.status(), axum::Json(Envelope::new(outcome, data))).into_response()
}

pub fn send_error(outcome: Outcome, detail: String) -> Response {
    (outcome.status(), axum::Json(Envelope::new(outcome, detail))).into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0:#}")]
    BadRequest(#[from] anyhow::Error),
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn outcome(&self) -> Outcome {
        match self {
            ApiError::NotFound(_) => Outcome::NotFound,
            ApiError::BadRequest(_) => Outcome::BadRequest,
            ApiError::Validation(_) => Outcome::ValidationError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::NotFound(_) => tracing::debug!(error = %self, "not found"),
            _ => tracing::warn!(error = %self, "request failed"),
        }
        send_error(self.outcome(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn envelope_carries_outcome_status_and_message() {
        let envelope = Envelope::new(Outcome::SuccessfulDelete, 7);
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.message, "Deleted successfully");
        assert_eq!(envelope.data, 7);
    }

    #[test]
    fn store_errors_flatten_to_bad_request() {
        let err = ApiError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.outcome(), Outcome::BadRequest);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_and_validation_statuses() {
        assert_eq!(ApiError::NotFound("Todo not found").into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Validation("missing field".into()).into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
