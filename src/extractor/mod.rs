// Extraction layer - gateway over the external extraction capability

pub mod errors;
pub mod formats;
pub mod models;
pub mod traits;
pub mod ytdlp;

pub use errors::ExtractError;
pub use formats::{normalize, MAX_CANDIDATES};
pub use models::{
    CandidateFormat, DirectLink, DownloadJob, JobState, MediaSummary, RawFormat, RawMediaInfo,
};
pub use traits::MediaExtractor;
pub use ytdlp::YtDlpExtractor;
