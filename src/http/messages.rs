use http::StatusCode;

/// Symbolic response outcomes and the status/message pair each one renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Successful,
    SuccessfulDelete,
    SuccessfulUpdate,
    NotFound,
    BadRequest,
    ValidationError,
}

impl Outcome {
    pub fn status(self) -> StatusCode {
        match self {
            Outcome::Successful | Outcome::SuccessfulDelete | Outcome::SuccessfulUpdate => StatusCode::OK,
            Outcome::NotFound => StatusCode::NOT_FOUND,
            Outcome::BadRequest => StatusCode::BAD_REQUEST,
            Outcome::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Outcome::Successful => "Success",
            Outcome::SuccessfulDelete => "Deleted successfully",
            Outcome::SuccessfulUpdate => "Updated successfully",
            Outcome::NotFound => "Not found",
            Outcome::BadRequest => "Bad request",
            Outcome::ValidationError => "Invalid request body",
        }
    }
}
