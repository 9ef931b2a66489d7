#![forbid(unsafe_code)]

//! Turns a located download into an HTTP response.

use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::ReaderStream;

use crate::artifact::TempFile;
use crate::download::ExtractionResult;
use crate::error::Result;
use crate::title::FALLBACK_TITLE;

pub const MAX_FILENAME_CHARS: usize = 100;

/// Reduces a title to `[A-Za-z0-9_\- ]`, at most [`MAX_FILENAME_CHARS`] long.
/// Other whitespace becomes a plain space so the result is always a valid
/// header value.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter_map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                Some(ch)
            } else if ch.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .take(MAX_FILENAME_CHARS)
        .collect();

    if cleaned.trim().is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        cleaned
    }
}

pub fn content_disposition(title: &str, extension: &str) -> String {
    format!(
        "attachment; filename=\"{}.{}\"",
        sanitize_title(title),
        extension
    )
}

/// File reader that owns its [`TempFile`] guard, so the file is removed once
/// the body stream is dropped.
struct OwnedTempReader {
    // Declared first so the handle closes before the guard unlinks.
    file: File,
    _guard: TempFile,
}

impl AsyncRead for OwnedTempReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

/// Streams the extracted file with download headers. The temp file is deleted
/// when the response body is dropped, or right away if building the response
/// fails.
pub async fn respond(result: ExtractionResult) -> Result<Response> {
    let ExtractionResult {
        file: guard,
        title,
        format,
    } = result;

    let file = File::open(guard.path()).await?;
    let size = file.metadata().await?.len();
    tracing::info!(path = %guard.path().display(), size, "streaming file");

    let disposition = HeaderValue::from_str(&content_disposition(&title, format.extension()))
        .expect("sanitized filenames are visible ASCII");

    let reader = OwnedTempReader {
        file,
        _guard: guard,
    };
    let body = Body::from_stream(ReaderStream::new(reader));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(size)),
        ],
        body,
    )
        .into_response())
}
