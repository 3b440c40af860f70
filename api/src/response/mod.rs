use axum::{Json, http::StatusCode};
use serde::Serialize;
use services::error::{ErrorKind, PresenceError};
use validator::ValidationErrors;

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// On failure `success` is `false`, `data` is the payload type's default and
/// `message` carries the reason.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Constructs a success response with the given data and message.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Constructs an error response with a message and default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// HTTP status for each error class.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Payload of failure envelopes.
#[derive(Serialize, Default)]
pub struct Empty;

pub type ErrorResponse = (StatusCode, Json<ApiResponse<Empty>>);

/// Turns an engine error into the failure envelope.
///
/// Database failures are logged and answered with a generic message.
pub fn from_presence_error(err: PresenceError) -> ErrorResponse {
    let kind = err.kind();
    let message = match kind {
        ErrorKind::Internal => {
            tracing::error!(error = %err, "request failed on the database");
            "Internal server error".to_string()
        }
        _ => err.to_string(),
    };
    (status_for(kind), Json(ApiResponse::error(message)))
}

/// Rejects a request body that failed `validator` checks.
pub fn validation_failed(errors: &ValidationErrors) -> ErrorResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::error(common::format_validation_errors(errors))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_status() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Invalid), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(ErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let err = PresenceError::Database(sea_orm::DbErr::Custom("disk I/O".into()));
        let (status, Json(body)) = from_presence_error(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.success);
        assert_eq!(body.message, "Internal server error");
    }
}
