pub mod config;
pub mod extractor;
pub mod pool;
pub mod server;
pub mod status;

pub use config::{AppConfig, DeliveryMode};
pub use extractor::{ExtractError, MediaExtractor, YtDlpExtractor};
pub use pool::WorkerPool;
pub use server::{router, AppState};
pub use status::{StatusRecord, StatusStore};
