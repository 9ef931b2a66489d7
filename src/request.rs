#![forbid(unsafe_code)]

//! Validated request payloads for both endpoints.

use serde::Deserialize;
use std::fmt;

use crate::error::{Error, Result};

/// Target container requested by the client. The wire slugs are the file
/// extensions (`mp3`, `mp4`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaFormat {
    Audio,
    Video,
}

impl MediaFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mp3" => Some(Self::Audio),
            "mp4" => Some(Self::Video),
            _ => None,
        }
    }

    /// Extension the tool produces for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Audio => "audio/mpeg",
            Self::Video => "video/mp4",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Raw `/download` query string before validation.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format: MediaFormat,
}

impl DownloadRequest {
    pub fn from_query(query: DownloadQuery) -> Result<Self> {
        let url = non_blank(query.url);
        let format = non_blank(query.format);
        let (Some(url), Some(format)) = (url, format) else {
            return Err(Error::Validation("URL and format are required"));
        };
        let format =
            MediaFormat::parse(&format).ok_or(Error::Validation("Format must be mp3 or mp4"))?;
        Ok(Self { url, format })
    }
}

/// Raw `/info` body.
#[derive(Debug, Default, Deserialize)]
pub struct InfoBody {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRequest {
    pub url: String,
}

impl InfoRequest {
    /// Parses the JSON body. Anything unreadable counts as a missing URL.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let parsed: InfoBody = serde_json::from_slice(body).unwrap_or_default();
        non_blank(parsed.url)
            .map(|url| Self { url })
            .ok_or(Error::Validation("URL is required"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
