#![forbid(unsafe_code)]

//! Error taxonomy shared by the download pipeline and the metadata endpoint.
//!
//! Every variant maps to exactly one HTTP status. Title lookups and temp-file
//! cleanup never produce one of these; they recover locally.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing request input.
    #[error("{0}")]
    Validation(&'static str),

    /// The tool binary could not be spawned at all.
    #[error("yt-dlp not found. Please install it: brew install yt-dlp")]
    ToolNotFound {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool hit YouTube's bot check; cookies are needed.
    #[error("YouTube requires authentication. Please add cookies.txt file.")]
    AuthenticationRequired,

    /// Nonzero exit; carries the tool's diagnostic output.
    #[error("{0}")]
    DownloadFailed(String),

    /// The tool exited cleanly but the expected file is not on disk.
    #[error("Output file not found")]
    OutputMissing { path: PathBuf },

    #[error("Failed to parse video info")]
    Parse(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::ToolNotFound { .. }
            | Error::AuthenticationRequired
            | Error::DownloadFailed(_)
            | Error::OutputMissing { .. }
            | Error::Parse(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = serde_json::json!({
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
