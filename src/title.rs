#![forbid(unsafe_code)]

use crate::ytdlp::YtDlp;

/// Used whenever the real title cannot be recovered.
pub const FALLBACK_TITLE: &str = "download";

/// Asks the tool for the canonical title of `url`.
///
/// This is a separate invocation from the extraction and it never fails: the
/// media file already exists by the time this runs, so a missing title only
/// costs the client a nicer filename.
pub async fn resolve_title(ytdlp: &YtDlp, url: &str) -> String {
    match ytdlp.get_title(url).await {
        Ok(output) if output.success() => {
            let title = output.stdout.trim();
            if title.is_empty() {
                tracing::debug!("title lookup returned nothing");
                FALLBACK_TITLE.to_string()
            } else {
                title.to_string()
            }
        }
        Ok(output) => {
            tracing::warn!(code = ?output.code, stderr = %output.stderr.trim(), "title lookup failed");
            FALLBACK_TITLE.to_string()
        }
        Err(err) => {
            tracing::warn!(error = %err, "title lookup could not run");
            FALLBACK_TITLE.to_string()
        }
    }
}
