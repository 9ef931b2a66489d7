#![forbid(unsafe_code)]

//! HTTP front-end for `yt-dlp`: metadata lookups and converted media downloads
//! streamed straight back to the client.

pub mod api;
pub mod artifact;
pub mod config;
pub mod cookies;
pub mod download;
pub mod error;
pub mod info;
pub mod process;
pub mod request;
pub mod stream;
pub mod title;
pub mod ytdlp;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
