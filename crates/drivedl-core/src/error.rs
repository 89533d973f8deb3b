//! Classified download failures.

use std::path::PathBuf;

/// Failures the CLI reports distinctly. Plumbing errors travel as `anyhow`.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// No file ID could be found in the shareable link.
    #[error("could not extract file ID from link: {0}")]
    InvalidLink(String),

    /// Final response was not `200 OK`. `body` is the (truncated) response text.
    #[error("error downloading file: HTTP {code}\nResponse: {body}")]
    HttpStatus { code: u32, body: String },

    /// curl reported a transport failure (DNS, connect, timeout, ...).
    #[error("{context}: {source}")]
    Transfer {
        context: &'static str,
        #[source]
        source: curl::Error,
    },

    /// Writing the body to disk failed.
    #[error("error writing file to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DriveError {
    /// True when the failure came from the local filesystem rather than the network.
    pub fn is_write_error(&self) -> bool {
        matches!(self, DriveError::Write { .. })
    }
}
