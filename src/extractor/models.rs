// Common data models for the extraction layer

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

/// One rendition as reported by the extraction capability, before any
/// normalization. Absent fields stay absent; defaults are applied only when
/// deriving labels and summaries.
#[derive(Debug, Clone, Default)]
pub struct RawFormat {
    /// Opaque rendition identifier (e.g. "137", "22")
    pub format_id: String,
    /// Container extension (mp4, webm, m4a)
    pub ext: String,
    /// Explicit resolution string (e.g. "1920x1080" or "720p"), if reported
    pub resolution: Option<String>,
    /// Video height in pixels
    pub height: Option<u32>,
    /// Exact file size in bytes
    pub filesize: Option<u64>,
    /// Approximate file size (when exact is unknown)
    pub filesize_approx: Option<u64>,
    /// Human-readable quality note (e.g. "1080p", "tiny")
    pub format_note: Option<String>,
    /// Video codec (avc1, vp9, none)
    pub vcodec: Option<String>,
    /// Audio codec (mp4a, opus, none)
    pub acodec: Option<String>,
}

impl RawFormat {
    /// Whether a video track is present. An absent codec field counts as
    /// present; only an explicit "none" marks an audio-only rendition.
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    /// Whether an audio track is present (absence rule as in [`Self::has_video`]).
    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }

    /// Exact file size when known, approximate otherwise.
    pub fn size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    /// Resolution label used for deduplication and ranking: the reported
    /// resolution string when non-empty, else `"{height}p"`, else `"unknownp"`.
    pub fn resolution_label(&self) -> String {
        if let Some(res) = self.resolution.as_deref().filter(|r| !r.is_empty()) {
            return res.to_string();
        }
        match self.height {
            Some(h) => format!("{h}p"),
            None => "unknownp".to_string(),
        }
    }
}

/// Raw metadata for one media URL, straight from the capability.
#[derive(Debug, Clone, Default)]
pub struct RawMediaInfo {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    /// Whole seconds
    pub duration: u64,
    pub formats: Vec<RawFormat>,
}

/// One selectable rendition after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateFormat {
    pub format_id: String,
    pub ext: String,
    pub resolution: String,
    pub filesize: Option<u64>,
    pub format_note: String,
}

/// Metadata plus the ranked candidate list returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct MediaSummary {
    pub title: String,
    pub thumbnail: String,
    pub duration: u64,
    pub video_id: String,
    pub formats: Vec<CandidateFormat>,
}

/// Ephemeral direct-access link for a single rendition.
#[derive(Debug, Clone)]
pub struct DirectLink {
    /// Absent when the capability reports no direct URL for the selected
    /// rendition. Expires upstream; never cache it.
    pub url: Option<String>,
    pub title: String,
    pub ext: String,
}

/// Completion state of a server-side download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One server-side download request.
///
/// The generated id keys the output path, so concurrent jobs never collide.
/// The final filename is only known once the capability finishes writing and
/// has substituted its own extension into the template.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: String,
    pub output_template: PathBuf,
    pub filename: Option<String>,
    pub state: JobState,
}

impl DownloadJob {
    pub fn new(download_dir: &Path) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        let output_template = download_dir.join(format!("{id}.%(ext)s"));
        Self {
            id,
            output_template,
            filename: None,
            state: JobState::Pending,
        }
    }

    /// Record the final path reported by the capability.
    pub fn complete(&mut self, final_path: &Path) {
        self.filename = final_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.state = JobState::Completed;
    }

    pub fn fail(&mut self) {
        self.state = JobState::Failed;
    }
}
