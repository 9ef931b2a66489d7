#![forbid(unsafe_code)]

//! Request-scoped download pipeline.
//!
//! `Validated → Extracting → Locating → ResolvingTitle → Streaming → Cleaned`.
//! Everything up to `ResolvingTitle` happens here; the streaming responder
//! takes over from the returned [`ExtractionResult`].

use std::path::Path;
use tracing::Instrument;

use crate::artifact::{TempArtifact, TempFile};
use crate::error::Result;
use crate::request::{DownloadRequest, MediaFormat};
use crate::title::resolve_title;
use crate::ytdlp::YtDlp;

/// A converted file ready to be streamed, plus the name to offer the client.
#[derive(Debug)]
pub struct ExtractionResult {
    pub file: TempFile,
    pub title: String,
    pub format: MediaFormat,
}

/// Removes the request's leftovers unless disarmed. Also fires when the
/// request future is dropped mid-extraction, after `kill_on_drop` has stopped
/// the tool.
struct LeftoverSweep<'a> {
    artifact: &'a TempArtifact,
    armed: bool,
}

impl Drop for LeftoverSweep<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.artifact.discard_leftovers();
        }
    }
}

/// Runs the extraction for `request` into `temp_dir`.
///
/// On any failure, or if the returned future is dropped before completing,
/// the request's temp files are removed.
pub async fn extract(
    ytdlp: &YtDlp,
    temp_dir: &Path,
    request: &DownloadRequest,
) -> Result<ExtractionResult> {
    let artifact = TempArtifact::new(temp_dir, request.format);
    let span = tracing::info_span!(
        "download",
        id = %artifact.id(),
        url = %request.url,
        format = %request.format,
    );

    async {
        tracing::info!(template = %artifact.output_template().display(), "starting download");
        let mut sweep = LeftoverSweep {
            artifact: &artifact,
            armed: true,
        };
        let result = run_stages(ytdlp, &artifact, &request.url).await;
        sweep.armed = result.is_err();
        result
    }
    .instrument(span)
    .await
}

async fn run_stages(ytdlp: &YtDlp, artifact: &TempArtifact, url: &str) -> Result<ExtractionResult> {
    let outcome = ytdlp
        .download(url, artifact.format(), &artifact.output_template())
        .await?;
    if let Some(destination) = &outcome.destination {
        tracing::debug!(destination = %destination.display(), "tool reported destination");
    }

    let file = artifact.locate().await?;
    let title = resolve_title(ytdlp, url).await;
    tracing::info!(%title, "extraction complete");

    Ok(ExtractionResult {
        file,
        title,
        format: artifact.format(),
    })
}
