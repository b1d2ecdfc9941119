use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::cortex::CortexError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad level/topic, missing text or sentence, unreadable body.
    #[error("{0}")]
    InvalidArgument(String),

    /// Completion call, filesystem or synthesis failure. Carries the cause.
    #[error("{0}")]
    UpstreamFailure(String),

    #[error("Rate limited")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    /// Wraps a cause under an operation prefix, e.g. "Export failed: ...".
    pub fn upstream(context: &str, cause: impl std::fmt::Display) -> Self {
        AppError::UpstreamFailure(format!("{}: {}", context, cause))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<CortexError> for AppError {
    fn from(e: CortexError) -> Self {
        AppError::upstream("Failed to generate sentence", e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::UpstreamFailure(msg) = &self {
            log::error!("{}", msg);
        }
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::invalid("Invalid topic").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::upstream("Export failed", "boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_upstream_message_embeds_cause() {
        let err = AppError::upstream("Audio generation failed", "disk full");
        assert_eq!(err.to_string(), "Audio generation failed: disk full");
    }

    #[test]
    fn test_cortex_error_converts() {
        let err: AppError = CortexError::EmptyReply.into();
        assert!(matches!(err, AppError::UpstreamFailure(_)));
        assert!(err.to_string().starts_with("Failed to generate sentence: "));
    }
}
