#![forbid(unsafe_code)]

//! Argument construction for every yt-dlp call the service makes.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::cookies::CookieFile;
use crate::error::{Error, Result};
use crate::info::RawVideoInfo;
use crate::process::{ToolOutput, run_tool};
use crate::request::MediaFormat;

pub const DEFAULT_YTDLP_BIN: &str = "yt-dlp";

/// Best MP4 video + M4A audio, then a single-file MP4, then anything.
const VIDEO_FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

static DESTINATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\] Destination: (.+\.(?:mp3|mp4|webm|m4a))")
        .expect("destination pattern is valid")
});

/// What a successful extraction reported on stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Last `[download] Destination:` path printed by the tool. This is an
    /// intermediate stream file in most cases, so it is only logged.
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    cookies: CookieFile,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>, cookies: CookieFile) -> Self {
        Self {
            program: program.into(),
            cookies,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn cookies(&self) -> &CookieFile {
        &self.cookies
    }

    pub fn download_args(&self, url: &str, format: MediaFormat, template: &Path) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
        ];
        args.extend(self.cookies.args());

        match format {
            MediaFormat::Audio => args.extend(
                ["-x", "--audio-format", "mp3", "--audio-quality", "0"].map(String::from),
            ),
            MediaFormat::Video => args.extend(
                [
                    "-f",
                    VIDEO_FORMAT_SELECTOR,
                    "--merge-output-format",
                    "mp4",
                    "--remux-video",
                    "mp4",
                ]
                .map(String::from),
            ),
        }

        args.push(url.to_string());
        args
    }

    pub fn title_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--get-title".to_string(), "--no-warnings".to_string()];
        args.extend(self.cookies.args());
        args.push(url.to_string());
        args
    }

    pub fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
        ];
        args.extend(self.cookies.args());
        args.push(url.to_string());
        args
    }

    /// Runs the extraction into `template`. Success only means the tool exited
    /// cleanly; locating the file is the caller's job.
    pub async fn download(
        &self,
        url: &str,
        format: MediaFormat,
        template: &Path,
    ) -> Result<DownloadOutcome> {
        let args = self.download_args(url, format, template);
        let output = run_tool(&self.program, &args).await?;
        tracing::info!(code = ?output.code, "yt-dlp download finished");
        if !output.success() {
            tracing::warn!(code = ?output.code, stderr = %output.stderr.trim(), "yt-dlp download failed");
        }
        let output = output.into_result("Download failed")?;
        Ok(DownloadOutcome {
            destination: destination_hint(&output.stdout),
        })
    }

    /// Raw stdout of a `--get-title` call; the title resolver decides how to
    /// degrade.
    pub async fn get_title(&self, url: &str) -> Result<ToolOutput> {
        run_tool(&self.program, &self.title_args(url)).await
    }

    pub async fn dump_info(&self, url: &str) -> Result<RawVideoInfo> {
        let output = run_tool(&self.program, &self.info_args(url)).await?;
        if !output.success() {
            tracing::warn!(code = ?output.code, stderr = %output.stderr.trim(), "yt-dlp metadata fetch failed");
        }
        let output = output.into_result("yt-dlp process failed")?;
        serde_json::from_str(&output.stdout).map_err(Error::Parse)
    }

    /// `yt-dlp --version`, trimmed.
    pub async fn version(&self) -> Result<String> {
        let output = run_tool(&self.program, &["--version".to_string()])
            .await?
            .into_result("yt-dlp --version failed")?;
        Ok(output.stdout.trim().to_string())
    }
}

/// Picks the last destination line out of the tool's progress output.
pub fn destination_hint(stdout: &str) -> Option<PathBuf> {
    DESTINATION_LINE
        .captures_iter(stdout)
        .last()
        .and_then(|captures| captures.get(1))
        .map(|path| PathBuf::from(path.as_str().trim()))
}
