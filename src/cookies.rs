#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

pub const DEFAULT_COOKIES_PATH: &str = "/app/cookies.txt";

/// Optional Netscape cookie jar handed to yt-dlp.
///
/// The file is looked up on every call because operators drop it in (or
/// remove it) while the server is running.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `--cookies <path>` when the file exists, nothing otherwise.
    pub fn args(&self) -> Vec<String> {
        let exists = self.path.is_file();
        tracing::debug!(path = %self.path.display(), exists, "checked cookies file");
        if exists {
            vec![
                "--cookies".to_string(),
                self.path.to_string_lossy().into_owned(),
            ]
        } else {
            Vec::new()
        }
    }
}

impl Default for CookieFile {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIES_PATH)
    }
}
