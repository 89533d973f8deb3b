//! Shareable link parsing.
//!
//! Accepts the common Google Drive link shapes:
//! - `https://drive.google.com/file/d/<ID>/view?usp=sharing`
//! - `https://drive.google.com/uc?id=<ID>&export=download`
//! - `https://drive.google.com/open?id=<ID>`

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static FILE_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"id=([a-zA-Z0-9_-]+)|file/d/([a-zA-Z0-9_-]+)").expect("file ID regex is valid")
});

/// Opaque file identifier taken from a shareable link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the file ID from a shareable link.
///
/// The first `id=<ID>` or `file/d/<ID>` occurrence wins. Returns `None` when
/// the link contains neither.
pub fn extract_file_id(link: &str) -> Option<FileId> {
    let caps = FILE_ID_REGEX.captures(link)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| FileId(m.as_str().to_string()))
}
