use salvo::prelude::*;
use serde_json::json;
use thiserror::Error;

use crate::chat::ChatError;
use crate::quiz::QuizError;
use crate::scan::ScanError;

/// An error rendered as `{"error": message}` with a status code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unsupported_media_type() -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Request must be JSON")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn render(&self, res: &mut Response) {
        render_error(res, self.status, &self.message);
    }
}

pub fn render_error(res: &mut Response, status: StatusCode, message: &str) {
    res.status_code(status);
    res.render(Json(json!({ "error": message })));
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        let status = match &err {
            ScanError::Validation(_) | ScanError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ScanError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ScanError::Inference(_) => StatusCode::BAD_GATEWAY,
            ScanError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::Unavailable(_) => Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
            _ => Self::internal("Failed to process risk assessment."),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage => Self::bad_request(err.to_string()),
            ChatError::Unavailable(_) => Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
            ChatError::Provider(_) => Self::new(
                StatusCode::BAD_GATEWAY,
                "The assistant was unable to generate a response at this time. Please try again later.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseError;
    use crate::inference::InferenceError;
    use crate::llm::LlmError;

    #[test]
    fn scan_errors_map_to_statuses() {
        let cases = [
            (ScanError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ScanError::InvalidImage("x".into()), StatusCode::BAD_REQUEST),
            (ScanError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                ScanError::Inference(InferenceError::Network("x".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ScanError::Storage(DatabaseError::Query("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn chat_provider_errors_hide_upstream_details() {
        let err = ApiError::from(ChatError::Provider(LlmError::Api {
            status: 401,
            message: "bad key sk-123".to_string(),
        }));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(!err.message.contains("sk-123"));
    }

    #[test]
    fn quiz_errors_other_than_unavailable_are_internal() {
        let err = ApiError::from(QuizError::InvalidRange("x".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to process risk assessment.");
    }
}
