#![forbid(unsafe_code)]

//! Axum surface: `GET /download` and `POST /info`.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    response::Response,
    routing::{get, post},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::download;
use crate::error::Result;
use crate::info::{VideoInfo, fetch_info};
use crate::request::{DownloadQuery, DownloadRequest, InfoRequest};
use crate::stream;
use crate::ytdlp::YtDlp;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ytdlp: Arc<YtDlp>,
    pub temp_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(ytdlp: YtDlp, temp_dir: PathBuf) -> Self {
        Self {
            ytdlp: Arc::new(ytdlp),
            temp_dir: Arc::new(temp_dir),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/download", get(download_media))
        .route("/info", post(video_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn download_media(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let request = DownloadRequest::from_query(query)?;
    let result = download::extract(&state.ytdlp, &state.temp_dir, &request).await?;
    stream::respond(result).await
}

async fn video_info(State(state): State<AppState>, body: Bytes) -> Result<Json<VideoInfo>> {
    let request = InfoRequest::from_body(&body)?;
    let info = fetch_info(&state.ytdlp, &request.url).await?;
    Ok(Json(info))
}
