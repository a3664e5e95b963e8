// Extraction gateway trait definition

use std::path::{Path, PathBuf};

use super::errors::ExtractError;
use super::models::{DirectLink, RawMediaInfo};

/// Gateway over the external extraction capability.
///
/// Every method performs blocking network I/O against the source platform and
/// can take tens of seconds. Callers route invocations through the worker
/// pool, never a runtime thread. Implementations surface every underlying
/// failure as [`ExtractError`] immediately; nothing is retried here.
pub trait MediaExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Fetch metadata and the raw rendition list without downloading.
    fn describe(&self, url: &str) -> Result<RawMediaInfo, ExtractError>;

    /// Resolve the ephemeral direct URL for one rendition. No disk writes.
    fn resolve_direct(&self, url: &str, format_id: &str) -> Result<DirectLink, ExtractError>;

    /// Download one rendition to a path derived from `output_template` (the
    /// capability substitutes its own extension) and return the final path
    /// once writing completes.
    fn materialize(
        &self,
        url: &str,
        format_id: &str,
        output_template: &Path,
    ) -> Result<PathBuf, ExtractError>;
}
