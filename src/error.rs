/*
 * Responsibility
 * - アプリ共通の AppError 定義 (closed taxonomy: ErrorKind)
 * - ErrorClassifier: AppError -> (status, JSON body) の唯一の変換点
 * - IntoResponse 実装 (gateway / handler / transport layer すべてここを通る)
 */
use std::sync::OnceLock;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

pub const UNAUTHORIZED_MESSAGE: &str = "User not authorized";
const INTERNAL_MESSAGE: &str = "Internal Server Error";
const TIMEOUT_MESSAGE: &str = "Request Timeout";

/// Client-visible error categories. Every `AppError` maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    ValidationFailure,
    NotFound,
    Timeout,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::ValidationFailure => "ValidationFailure",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Internal => "Internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("validation failure: {0}")]
    Validation(String),
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("request timed out")]
    Timeout,
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Validation(_) => ErrorKind::ValidationFailure,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::Timeout => ErrorKind::Timeout,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Maps failures to their client-visible `(status, body)`.
///
/// The only configurable decision is the status used for `ValidationFailure`:
/// the legacy deployment answered 401, the corrected mapping is 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassifier {
    validation_status: StatusCode,
}

static CLASSIFIER: OnceLock<ErrorClassifier> = OnceLock::new();
static CORRECTED: ErrorClassifier = ErrorClassifier::corrected();

impl ErrorClassifier {
    pub const fn corrected() -> Self {
        Self {
            validation_status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn with_validation_status(validation_status: StatusCode) -> Self {
        Self { validation_status }
    }

    /// Install the process-wide classifier. Only the first call wins.
    pub fn install(self) -> bool {
        CLASSIFIER.set(self).is_ok()
    }

    /// The installed classifier, or the corrected mapping when none was installed.
    pub fn current() -> &'static ErrorClassifier {
        CLASSIFIER.get().unwrap_or(&CORRECTED)
    }

    pub fn classify(&self, err: &AppError) -> (StatusCode, ErrorBody) {
        let kind = err.kind();
        let (status, message) = match kind {
            ErrorKind::Unauthorized => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string()),
            ErrorKind::ValidationFailure => (self.validation_status, kind.as_str().to_string()),
            ErrorKind::NotFound => match err {
                AppError::NotFound { resource } => {
                    (StatusCode::NOT_FOUND, format!("{resource} not found"))
                }
                _ => (StatusCode::NOT_FOUND, kind.as_str().to_string()),
            },
            ErrorKind::Timeout => (StatusCode::REQUEST_TIMEOUT, TIMEOUT_MESSAGE.to_string()),
            // Internal detail stays in the logs.
            ErrorKind::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            ),
        };

        (status, ErrorBody { message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) => tracing::error!(detail = %detail, "internal error"),
            AppError::Validation(detail) => tracing::debug!(detail = %detail, "validation failure"),
            AppError::Unauthorized(reason) => tracing::debug!(reason = %reason, "unauthorized"),
            _ => {}
        }

        let (status, body) = ErrorClassifier::current().classify(&self);
        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Db(err) => AppError::Internal(format!("db error: {err}")),
            RepoError::Conflict => AppError::validation("conflict"),
        }
    }
}
