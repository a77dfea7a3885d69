use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use question_parser::ParseError;
use rag_common::chat::ChatClientError;
use rag_common::error::CommonError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("chat completion failed: {0}")]
    Chat(#[from] ChatClientError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::BadRequest("Only PDF files are allowed.".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("collection 'x' not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Parse(ParseError::NoJson).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Common(CommonError::Pdf("broken".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_message_is_unprefixed() {
        let err = AppError::BadRequest("Only PDF files are allowed.".into());
        assert_eq!(err.to_string(), "Only PDF files are allowed.");
    }
}
