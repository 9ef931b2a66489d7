#![forbid(unsafe_code)]

//! HTTP server binary. Resolves settings, checks that yt-dlp is reachable and
//! serves `/download` and `/info` until Ctrl+C.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fetchtube::api::{AppState, router};
use fetchtube::config::{RuntimeOverrides, RuntimeSettings, resolve_runtime_settings};
use fetchtube::cookies::CookieFile;
use fetchtube::ytdlp::YtDlp;
use tokio::signal;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "fetchtube=info,tower_http=info";

#[derive(Debug, Clone, Parser)]
#[command(name = "fetchtube-server", version, about = "Serve yt-dlp downloads over HTTP")]
struct ServerArgs {
    /// Address to listen on (FETCHTUBE_HOST).
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (FETCHTUBE_PORT).
    #[arg(long)]
    port: Option<u16>,
    /// Cookie jar passed to yt-dlp when present (COOKIES_PATH).
    #[arg(long)]
    cookies: Option<PathBuf>,
    /// yt-dlp executable (YTDLP_BIN).
    #[arg(long)]
    ytdlp: Option<PathBuf>,
    /// Directory for in-flight downloads (FETCHTUBE_TEMP_DIR).
    #[arg(long)]
    temp_dir: Option<PathBuf>,
    /// Dotenv file to read settings from.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

impl ServerArgs {
    fn into_overrides(self) -> RuntimeOverrides {
        RuntimeOverrides {
            host: self.host,
            port: self.port,
            cookies_path: self.cookies,
            ytdlp_bin: self.ytdlp,
            temp_dir: self.temp_dir,
            env_path: self.env_file,
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn listen_addr(settings: &RuntimeSettings) -> Result<SocketAddr> {
    let host = settings
        .host
        .parse::<IpAddr>()
        .with_context(|| format!("expected an IPv4 or IPv6 address, got {:?}", settings.host))?;
    Ok(SocketAddr::new(host, settings.port))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = resolve_runtime_settings(ServerArgs::parse().into_overrides())?;
    let addr = listen_addr(&settings)?;

    tokio::fs::create_dir_all(&settings.temp_dir)
        .await
        .with_context(|| format!("creating temp dir {}", settings.temp_dir.display()))?;

    let ytdlp = YtDlp::new(
        settings.ytdlp_bin.clone(),
        CookieFile::new(settings.cookies_path.clone()),
    );
    // Downloads report a missing tool per request; this only makes it obvious
    // at boot.
    match ytdlp.version().await {
        Ok(version) => tracing::info!(%version, program = %ytdlp.program().display(), "found yt-dlp"),
        Err(err) => tracing::warn!(error = %err, program = %ytdlp.program().display(), "yt-dlp is not usable"),
    }
    tracing::info!(
        cookies = %settings.cookies_path.display(),
        present = settings.cookies_path.is_file(),
        temp_dir = %settings.temp_dir.display(),
        "configured"
    );

    let app = router(AppState::new(ytdlp, settings.temp_dir.clone()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    // Only affects graceful shutdown; Ctrl+C still terminates the process.
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
    }
}
