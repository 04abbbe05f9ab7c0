//! Typed errors and HTTP mapping.
//!
//! Handlers signal failures by returning [`AppError`]; the response boundary
//! in `web::boundary` is the single place where those failures are rendered
//! and logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// 4xx failure whose message is safe to expose to the client.
    #[error("{message}")]
    Client { status: StatusCode, message: String },
    #[error("not found")]
    NotFound,
    /// Uniform 401 regardless of which check failed.
    #[error("unauthorized")]
    Unauthorized,
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Client {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }

    /// Classify an arbitrary status code into the error taxonomy. Used by the
    /// fault-injection route; 4xx keeps its code, everything else is a 500.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match StatusCode::from_u16(status) {
            Ok(StatusCode::NOT_FOUND) => AppError::NotFound,
            Ok(StatusCode::UNAUTHORIZED) => AppError::Unauthorized,
            Ok(code) if code.is_client_error() => AppError::Client {
                status: code,
                message,
            },
            _ => AppError::Internal(message),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Client { status, .. } => *status,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Db(e) if is_unique_violation(e) => StatusCode::CONFLICT,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self.status() {
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::CONFLICT => "conflict",
            s if s.is_client_error() => "bad_request",
            _ => "internal_error",
        }
    }

    /// Message safe to show to the client. 5xx causes are hidden.
    pub fn public_message(&self) -> String {
        let status = self.status();
        if status.is_server_error() {
            "internal server error".to_string()
        } else if status == StatusCode::NOT_FOUND {
            "not found".to_string()
        } else if status == StatusCode::UNAUTHORIZED {
            "unauthorized".to_string()
        } else {
            self.to_string()
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(dbe) => dbe.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Classified failure attached to error responses so the outer boundary can
/// re-render the body with the negotiated content type and log the cause.
#[derive(Debug, Clone)]
pub struct ErrorCause {
    pub status: StatusCode,
    pub code: &'static str,
    /// Safe for the client.
    pub message: String,
    /// Full cause, for the log only.
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let cause = ErrorCause {
            status: self.status(),
            code: self.code(),
            message: self.public_message(),
            detail: self.to_string(),
        };
        let mut res = (
            cause.status,
            Json(serde_json::json!({ "error": cause.message })),
        )
            .into_response();
        res.extensions_mut().insert(cause);
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_classifies_by_code() {
        assert!(matches!(AppError::from_status(404, "x"), AppError::NotFound));
        assert!(matches!(
            AppError::from_status(401, "x"),
            AppError::Unauthorized
        ));
        match AppError::from_status(418, "teapot") {
            AppError::Client { status, message } => {
                assert_eq!(status.as_u16(), 418);
                assert_eq!(message, "teapot");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            AppError::from_status(503, "x"),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn public_message_hides_internal_causes() {
        let err = AppError::Internal("secret database incident".into());
        assert_eq!(err.public_message(), "internal server error");

        let err = AppError::bad_request("name is required");
        assert_eq!(err.public_message(), "name is required");
    }

    #[test]
    fn unauthorized_is_uniform() {
        assert_eq!(AppError::Unauthorized.public_message(), "unauthorized");
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = AppError::Db(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "not_found");
    }
}
