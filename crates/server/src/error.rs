//! API error handling

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, FromRequest,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON request body; malformed or ill-typed payloads become a 400 `ApiError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Error returned by every gateway endpoint as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    /// Gateway failure reported as `"{prefix}: {detail}"` under the upstream status
    pub fn gateway(prefix: &str, err: &examiner_core::Error) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match err {
            examiner_core::Error::InvalidInput(msg) => msg.clone(),
            other => format!("{}: {}", prefix, other.detail()),
        };
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<examiner_core::Error> for ApiError {
    fn from(err: examiner_core::Error) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examiner_core::Error;

    #[test]
    fn test_gateway_keeps_upstream_status() {
        let err = ApiError::gateway("Ask API failed", &Error::completion("rate limited").with_status(429));
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message, "Ask API failed: rate limited");
    }

    #[test]
    fn test_gateway_defaults_to_500() {
        let err = ApiError::gateway("Transcription failed", &Error::transcription("socket closed"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_input_is_bad_request() {
        let err = ApiError::gateway(
            "Summarize API failed",
            &Error::InvalidInput("No messages provided for summarization".into()),
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "No messages provided for summarization");
    }

    #[test]
    fn test_from_core_error() {
        let err: ApiError = Error::EmptyResult("Failed to generate summary from LLM".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to generate summary from LLM");
    }
}
