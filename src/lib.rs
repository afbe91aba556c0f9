pub mod cli;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod operations;
pub mod store;

pub use config::{S3Config, SyncOptions};
pub use error::{ConfigError, SyncError};
pub use models::{Direction, TransferItem, TransferOutcome, TransferReport, TransferStatus};
pub use operations::ScreenshotSync;

/// Result type used across the library.
pub type Result<T> = std::result::Result<T, SyncError>;
