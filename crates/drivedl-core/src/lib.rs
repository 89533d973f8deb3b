pub mod config;
pub mod logging;

pub mod confirm;
pub mod destination;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod link;
pub mod storage;
pub mod url_model;

pub use downloader::{download, DownloadOutcome};
pub use error::DriveError;
pub use link::{extract_file_id, FileId};
