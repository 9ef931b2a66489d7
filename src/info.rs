#![forbid(unsafe_code)]

//! Metadata lookups for `/info`: platform detection plus a trimmed-down view
//! of `yt-dlp --dump-json`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::ytdlp::YtDlp;

/// How many entries of each format list are returned (the tail of yt-dlp's
/// list, which is sorted worst to best).
const FORMATS_PER_KIND: usize = 5;

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:youtube\.com|youtu\.be)").expect("youtube pattern is valid")
});
static TIKTOK_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tiktok\.com").expect("tiktok pattern is valid"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
}

impl Platform {
    pub fn detect(url: &str) -> Option<Self> {
        if YOUTUBE_URL.is_match(url) {
            Some(Self::Youtube)
        } else if TIKTOK_URL.is_match(url) {
            Some(Self::Tiktok)
        } else {
            None
        }
    }
}

/// The subset of yt-dlp's info JSON we read. Everything is optional; older or
/// non-YouTube extractors leave a lot out.
#[derive(Debug, Default, Deserialize)]
pub struct RawVideoInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<RawFormat>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
    pub abr: Option<f64>,
    pub format_note: Option<String>,
    pub resolution: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl RawFormat {
    fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }

    fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    fn is_audio_only(&self) -> bool {
        self.has_audio() && self.vcodec.as_deref() == Some("none")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub quality: String,
    pub resolution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatLists {
    pub audio: Vec<AudioFormat>,
    pub video: Vec<VideoFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub uploader: String,
    pub url: String,
    pub platform: Platform,
    pub formats: FormatLists,
}

impl VideoInfo {
    pub fn from_raw(raw: RawVideoInfo, url: &str, platform: Platform) -> Self {
        let formats = raw.formats.unwrap_or_default();

        let audio: Vec<AudioFormat> = formats
            .iter()
            .filter(|format| format.is_audio_only())
            .map(|format| AudioFormat {
                format_id: format.format_id.clone(),
                ext: format.ext.clone(),
                quality: format
                    .abr
                    .filter(|abr| *abr > 0.0)
                    .map(|abr| format!("{abr}kbps"))
                    .unwrap_or_else(|| "unknown".to_string()),
            })
            .collect();

        let video: Vec<VideoFormat> = formats
            .iter()
            .filter(|format| format.has_video() && format.has_audio())
            .map(|format| VideoFormat {
                format_id: format.format_id.clone(),
                ext: format.ext.clone(),
                quality: present(format.format_note.as_deref())
                    .unwrap_or_else(|| "unknown".to_string()),
                resolution: resolution_label(format),
            })
            .collect();

        Self {
            title: raw.title,
            thumbnail: raw.thumbnail,
            duration: raw.duration,
            uploader: present(raw.uploader.as_deref())
                .or_else(|| present(raw.channel.as_deref()))
                .unwrap_or_else(|| "Unknown".to_string()),
            url: url.to_string(),
            platform,
            formats: FormatLists {
                audio: tail(audio, FORMATS_PER_KIND),
                video: tail(video, FORMATS_PER_KIND),
            },
        }
    }
}

/// yt-dlp emits `""` for some fields it could not fill; those count as absent.
fn present(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

fn resolution_label(format: &RawFormat) -> String {
    if let Some(resolution) = present(format.resolution.as_deref()) {
        return resolution;
    }
    match (format.width, format.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => format!("{width}x{height}"),
        _ => "unknown".to_string(),
    }
}

fn tail<T>(mut items: Vec<T>, keep: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(keep);
    items.drain(..skip);
    items
}

/// Validates the platform, then asks the tool for the full info document.
pub async fn fetch_info(ytdlp: &YtDlp, url: &str) -> Result<VideoInfo> {
    let platform = Platform::detect(url)
        .ok_or(Error::Validation("Only YouTube and TikTok URLs are supported"))?;
    tracing::info!(url, ?platform, "fetching video info");
    let raw = ytdlp.dump_info(url).await?;
    Ok(VideoInfo::from_raw(raw, url, platform))
}
