// Process configuration loaded from the environment

use std::env;
use std::path::PathBuf;

/// Delivery behavior of `POST /api/video/download`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Hand back the upstream direct URL; no bytes touch our storage.
    #[default]
    DirectLink,
    /// Download server-side, then serve the file from disk.
    Materialize,
}

impl DeliveryMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "materialize" => Self::Materialize,
            _ => Self::DirectLink,
        }
    }
}

/// Global configuration, read once at startup and injected into handlers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address for the HTTP server
    pub bind: String,
    /// Allowed cross-origin callers; `["*"]` means any
    pub cors_origins: Vec<String>,
    /// Extraction worker pool size
    pub workers: usize,
    /// Directory materialized files are written to
    pub download_dir: PathBuf,
    /// SQLite database path for the status log
    pub db_path: PathBuf,
    /// How `POST /api/video/download` responds
    pub delivery: DeliveryMode,
    /// Socket timeout handed to yt-dlp, in seconds
    pub socket_timeout: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            cors_origins: vec!["*".to_string()],
            workers: 3,
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from("downloads")),
            db_path: PathBuf::from("data/vidsaver.db"),
            delivery: DeliveryMode::DirectLink,
            socket_timeout: 15,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: env::var("VIDSAVER_BIND").unwrap_or(defaults.bind),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            workers: env::var("VIDSAVER_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.workers),
            download_dir: env::var("VIDSAVER_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            db_path: env::var("VIDSAVER_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            delivery: env::var("VIDSAVER_DELIVERY")
                .map(|v| DeliveryMode::parse(&v))
                .unwrap_or(defaults.delivery),
            socket_timeout: env::var("VIDSAVER_SOCKET_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.socket_timeout),
        }
    }

    pub fn allow_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}

/// Split a comma-separated origin list, dropping empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
