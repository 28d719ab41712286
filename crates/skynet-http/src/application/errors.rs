//! Per-request failures and their HTTP status mapping.
//!
//! A [`RequestError`] is scoped to one request/response pair.  Handlers
//! return it with `?`, axum turns it into a plain-text response, and the
//! server keeps running.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

/// Errors that end a single request without affecting the server.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The multipart body was malformed or exceeded the size cap.
    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    /// The form did not contain the expected field.
    #[error("missing form field `{0}`")]
    MissingField(&'static str),

    /// The file part carried no filename.
    #[error("uploaded file has no filename")]
    MissingFileName,

    /// The submitted filename is empty or contains path components.
    #[error("invalid file name '{0}'")]
    InvalidFileName(String),

    /// The requested download path tries to leave the serving directory.
    #[error("invalid path '{0}'")]
    InvalidPath(String),

    /// Nothing servable exists at the requested path.
    #[error("'{0}' not found")]
    NotFound(String),

    /// The target filename exists and the collision policy refuses to replace it.
    #[error("file '{0}' already exists")]
    Conflict(String),

    /// Reading or writing the serving directory failed.
    #[error("storage error: {0}")]
    Storage(#[source] std::io::Error),
}

impl RequestError {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Multipart(e) => e.status(),
            RequestError::MissingField(_)
            | RequestError::MissingFileName
            | RequestError::InvalidFileName(_)
            | RequestError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::Conflict(_) => StatusCode::CONFLICT,
            RequestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("request failed: {self}");
        }
        (status, self.to_string()).into_response()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
