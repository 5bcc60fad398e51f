use axum::{response::{IntoResponse, Response}, http::StatusCode};
use serde::Serialize;
use tracing::error;

use crate::util::google_oauth::GatewayError;

#[derive(Debug, Serialize)]
pub enum HandlerErrorKind {
    NotFound,
    Validation,
    Internal,
    Unauthorized,
    Forbidden,
    Conflict,
    BadRequest,
    BadGateway,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::NotFound => "NotFound",
            HandlerErrorKind::Validation => "Validation",
            HandlerErrorKind::Internal => "Internal",
            HandlerErrorKind::Unauthorized => "Unauthorized",
            HandlerErrorKind::Forbidden => "Forbidden",
            HandlerErrorKind::Conflict => "Conflict",
            HandlerErrorKind::BadRequest => "BadRequest",
            HandlerErrorKind::BadGateway => "BadGateway",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Serialize)]
pub struct HandlerError {
    pub error: HandlerErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl HandlerError {
    pub fn new<T: Into<String>>(error: HandlerErrorKind, message: T) -> Self {
        HandlerError { error, message: message.into(), details: None }
    }

    pub fn with_details<T: Into<String>>(mut self, details: T) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn unauthorized() -> Self {
        HandlerError::new(HandlerErrorKind::Unauthorized, "Not authenticated")
    }

    pub fn forbidden() -> Self {
        HandlerError::new(HandlerErrorKind::Forbidden, "Access denied: Admins only")
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HandlerError::new(HandlerErrorKind::BadRequest, message)
    }

    pub fn not_found<T: Into<String>>(message: T) -> Self {
        HandlerError::new(HandlerErrorKind::NotFound, message)
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        HandlerError::new(HandlerErrorKind::Internal, message)
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = match self.error {
            HandlerErrorKind::NotFound => StatusCode::NOT_FOUND,
            HandlerErrorKind::Validation | HandlerErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            HandlerErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerErrorKind::Forbidden => StatusCode::FORBIDDEN,
            HandlerErrorKind::Conflict => StatusCode::CONFLICT,
            HandlerErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            HandlerErrorKind::BadGateway => StatusCode::BAD_GATEWAY,
        };
        let body = axum::Json(self);
        (status, body).into_response()
    }
}


#[derive(Debug, Clone)]
pub enum ServiceError {
    NotFound(String),
    InvalidInput(String),
    InternalError(String),
    Conflict(String),
    Unauthorized(String),
    /// The identity provider could not be reached.
    Upstream(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::InvalidInput(msg) => write!(f, "Invalid Input: {}", msg),
            ServiceError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::Upstream(msg) => write!(f, "Upstream Error: {}", msg),
        }
    }
}
impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// Allow conversion from RepositoryError to ServiceError
impl From<crate::repository::repository_error::RepositoryError> for ServiceError {
    fn from(err: crate::repository::repository_error::RepositoryError) -> Self {
        use crate::repository::repository_error::RepositoryError;
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::ValidationError(msg) => ServiceError::InvalidInput(msg),
            RepositoryError::AlreadyExists(msg) => ServiceError::Conflict(msg),
            RepositoryError::DatabaseError(msg) => ServiceError::InternalError(msg),
            RepositoryError::ConnectionError(msg) => ServiceError::InternalError(msg),
            RepositoryError::SerializationError(msg) => ServiceError::InternalError(msg),
            RepositoryError::Generic(e) => ServiceError::InternalError(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Request(e) => ServiceError::Upstream(format!("Identity provider unreachable: {}", e)),
            other => ServiceError::InternalError(other.to_string()),
        }
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => HandlerError::not_found(msg),
            ServiceError::InvalidInput(msg) => HandlerError::new(HandlerErrorKind::Validation, msg),
            ServiceError::Conflict(msg) => HandlerError::new(HandlerErrorKind::Conflict, msg),
            ServiceError::Unauthorized(msg) => HandlerError::new(HandlerErrorKind::Unauthorized, msg),
            ServiceError::Upstream(msg) => {
                error!("Upstream failure: {}", msg);
                HandlerError::new(HandlerErrorKind::BadGateway, "Identity provider error")
            }
            ServiceError::InternalError(msg) => {
                error!("Internal failure: {}", msg);
                HandlerError::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::repository_error::RepositoryError;

    #[test]
    fn test_repository_errors_map_to_handler_status() {
        let err: ServiceError = RepositoryError::not_found("product 1").into();
        let handler: HandlerError = err.into();
        assert_eq!(handler.into_response().status(), StatusCode::NOT_FOUND);

        let err: ServiceError = RepositoryError::AlreadyExists("dup".into()).into();
        let handler: HandlerError = err.into();
        assert_eq!(handler.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_token_is_internal() {
        let err: ServiceError = GatewayError::MissingToken.into();
        assert!(matches!(err, ServiceError::InternalError(_)));
    }

    #[test]
    fn test_upstream_is_bad_gateway() {
        let handler: HandlerError = ServiceError::Upstream("timeout".into()).into();
        assert_eq!(handler.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_server_side_failures_hide_details() {
        let handler: HandlerError = ServiceError::Upstream("HTTP 500: {\"token\":\"abc\"}".into()).into();
        assert!(handler.details.is_none());

        let err: ServiceError = RepositoryError::database("Write error: E11000 users.email").into();
        let handler: HandlerError = err.into();
        assert!(handler.details.is_none());
        assert_eq!(handler.message, "Internal server error");
    }
}
