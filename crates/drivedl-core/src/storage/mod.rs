//! Disk I/O and file lifecycle.
//!
//! The body is streamed into `<destination>.part` and renamed onto the final
//! name only after the transfer completed and the data was synced, so an
//! interrupted download never leaves a truncated file under the real name.

mod writer;

pub use writer::StorageWriter;

/// Temporary file suffix used before the final rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
