use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use visitlog::{
    AuthError, ImageError, SessionError, SubmissionError, ValidationErrors, VisitlogError,
};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Session not found. Please log in again.")]
    SessionNotFound,

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Please correct the highlighted fields.")]
    Validation(#[from] ValidationErrors),

    #[error("Please capture the image again.")]
    Image(#[from] ImageError),

    #[error("{}", .0.user_message())]
    Submission(#[from] SubmissionError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::UnknownIdentity) => StatusCode::FORBIDDEN,
            ApiError::Session(SessionError::NotManager) => StatusCode::FORBIDDEN,
            ApiError::Session(_) | ApiError::Validation(_) | ApiError::Image(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Submission(_) => StatusCode::BAD_GATEWAY,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::SessionNotFound => "SESSION_NOT_FOUND",
            ApiError::Session(_) => "SESSION_ERROR",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::Image(_) => "IMAGE_ERROR",
            ApiError::Submission(_) => "SUBMISSION_FAILED",
            ApiError::Auth(_) => "AUTH_FAILED",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Submission(e) => log::error!("Submission failed: {}", e),
            ApiError::Image(e) => log::warn!("Photo rejected: {}", e),
            ApiError::Internal(_) | ApiError::Config(_) => log::error!("{}", self),
            _ => log::debug!("Request failed: {}", self),
        }

        let mut error = json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        if let ApiError::Validation(errors) = &self {
            error["fields"] = json!(errors.errors);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

impl From<VisitlogError> for ApiError {
    fn from(err: VisitlogError) -> Self {
        match err {
            VisitlogError::Session(e) => ApiError::Session(e),
            VisitlogError::Validation(e) => ApiError::Validation(e),
            VisitlogError::Image(e) => ApiError::Image(e),
            VisitlogError::Submission(e) => ApiError::Submission(e),
            VisitlogError::Auth(e) => ApiError::Auth(e),
            VisitlogError::Config(e) => ApiError::Config(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(format!("IO error: {err}"))
    }
}
