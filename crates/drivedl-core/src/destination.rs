//! Output path selection.
//!
//! The user destination is interpreted as one of:
//! - an existing directory: the server filename is placed inside it
//! - a bare filename (no directory part, not existing): the working directory,
//!   under the server filename when there is one
//! - anything else: used as the full output path, parents created on demand

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name used inside a directory when the server sent no filename.
pub const FALLBACK_FILENAME: &str = "downloaded_file";

/// Why the chosen path did not come from the server filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationNote {
    /// Directory destination, no server filename: fell back to `downloaded_file`.
    NoFilenameInDirectory,
    /// Bare filename destination, no server filename.
    NoFilenameBareName,
    /// Full path destination, no server filename.
    NoFilenameAsSpecified,
}

impl DestinationNote {
    /// User-facing warning for a resolved `path`.
    pub fn message(&self, path: &Path) -> String {
        match self {
            DestinationNote::NoFilenameInDirectory => format!(
                "could not determine original filename; saving to '{}'",
                path.display()
            ),
            DestinationNote::NoFilenameBareName => format!(
                "no filename in Content-Disposition header, and destination was not a directory; saving to '{}'",
                path.display()
            ),
            DestinationNote::NoFilenameAsSpecified => format!(
                "no filename in Content-Disposition header; saving to '{}' as specified",
                path.display()
            ),
        }
    }
}

/// Final output path plus an optional warning for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub path: PathBuf,
    pub note: Option<DestinationNote>,
}

/// Picks the output path for a download.
///
/// `destination` defaults to `cwd`. Relative destinations are taken relative
/// to `cwd`. A destination ending in a path separator names a directory and is
/// created if missing. For a full-path destination the parent directories are
/// created here.
pub fn resolve_destination(
    destination: Option<&Path>,
    server_filename: Option<&str>,
    cwd: &Path,
) -> Result<ResolvedDestination> {
    let dest = match destination {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => cwd,
    };
    let full = cwd.join(dest);

    if names_directory(dest) && !full.exists() {
        fs::create_dir_all(&full)
            .with_context(|| format!("failed to create directory {}", full.display()))?;
    }

    if full.is_dir() {
        return Ok(match server_filename {
            Some(name) => ResolvedDestination {
                path: full.join(name),
                note: None,
            },
            None => ResolvedDestination {
                path: full.join(FALLBACK_FILENAME),
                note: Some(DestinationNote::NoFilenameInDirectory),
            },
        });
    }

    let bare = dest.parent().map_or(true, |p| p.as_os_str().is_empty());
    if bare && !full.exists() {
        return Ok(match server_filename {
            Some(name) => {
                tracing::debug!(
                    "server filename {} replaces bare destination {}",
                    name,
                    dest.display()
                );
                ResolvedDestination {
                    path: cwd.join(name),
                    note: None,
                }
            }
            None => ResolvedDestination {
                path: full,
                note: Some(DestinationNote::NoFilenameBareName),
            },
        });
    }

    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(ResolvedDestination {
        path: full,
        note: server_filename
            .is_none()
            .then_some(DestinationNote::NoFilenameAsSpecified),
    })
}

fn names_directory(dest: &Path) -> bool {
    let s = dest.as_os_str().to_string_lossy();
    s.ends_with('/') || s.ends_with(std::path::MAIN_SEPARATOR)
}
