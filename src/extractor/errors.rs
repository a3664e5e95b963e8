// Error types for the extraction layer

use thiserror::Error;

/// Failures surfaced by the extraction gateway and the offload pool.
///
/// Every variant carries free text only; handlers map all of them to the same
/// client-facing failure shape without preserving any upstream taxonomy.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// yt-dlp binary could not be located or started
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Output from the capability could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// The capability reported a failure (unsupported URL, network error,
    /// availability restriction, bad rendition selector, ...)
    #[error("extraction failed: {0}")]
    Failed(String),

    /// The worker pool has been drained and accepts no further work
    #[error("extraction workers unavailable")]
    WorkersUnavailable,
}
