use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::sheets::RetrievalError;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// A sheet could not be fetched or parsed
    Retrieval(RetrievalError),
    /// Chat completion call failed
    Assistant { status: Option<StatusCode>, message: String },
    /// Unknown chat session
    SessionNotFound(String),
    /// Invalid client input
    BadRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retrieval(err) => write!(f, "Sheet retrieval failed: {}", err),
            Self::Assistant { status: Some(status), message } => {
                write!(f, "Assistant error ({}): {}", status, message)
            }
            Self::Assistant { status: None, message } => write!(f, "Assistant error: {}", message),
            Self::SessionNotFound(id) => write!(f, "Chat session not found: {}", id),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Retrieval(err) => Some(err),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Retrieval(_) => StatusCode::BAD_GATEWAY,
            Self::Assistant { .. } => StatusCode::BAD_GATEWAY,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type_name(&self),
            }
        }));

        (status, body).into_response()
    }
}

pub fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::Retrieval(_) => "retrieval_error",
        AppError::Assistant { .. } => "assistant_error",
        AppError::SessionNotFound(_) => "session_not_found",
        AppError::BadRequest(_) => "bad_request",
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        Self::Retrieval(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AppError::SessionNotFound("abc".to_string());
        assert_eq!(error.to_string(), "Chat session not found: abc");

        let error = AppError::Assistant {
            status: Some(StatusCode::TOO_MANY_REQUESTS),
            message: "rate limited".to_string(),
        };
        assert_eq!(error.to_string(), "Assistant error (429 Too Many Requests): rate limited");
    }

    #[test]
    fn test_error_type_name() {
        assert_eq!(error_type_name(&AppError::BadRequest("x".to_string())), "bad_request");
        let retrieval = AppError::from(RetrievalError::Status {
            sheet: "Extra".to_string(),
            status: 500,
        });
        assert_eq!(error_type_name(&retrieval), "retrieval_error");
    }

    #[tokio::test]
    async fn test_error_response() {
        let error = AppError::SessionNotFound("missing".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let error = AppError::Assistant { status: None, message: "empty reply".to_string() };
        assert_eq!(error.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_no_error_maps_to_internal_server_error() {
        let errors = vec![
            AppError::from(RetrievalError::Status {
                sheet: "Piani".to_string(),
                status: 503,
            }),
            AppError::Assistant { status: None, message: "timeout".to_string() },
            AppError::SessionNotFound("gone".to_string()),
            AppError::BadRequest("Unknown tab: x".to_string()),
        ];

        let statuses: Vec<StatusCode> = errors
            .into_iter()
            .map(|error| error.into_response().status())
            .collect();
        assert_eq!(
            statuses,
            vec![
                StatusCode::BAD_GATEWAY,
                StatusCode::BAD_GATEWAY,
                StatusCode::NOT_FOUND,
                StatusCode::BAD_REQUEST,
            ]
        );
    }
}
