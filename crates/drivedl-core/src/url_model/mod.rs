//! Filename inference from response metadata.
//!
//! The server-suggested name comes from the Content-Disposition header and is
//! sanitized so it is always a single, portable path component.

mod content_disposition;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use sanitize::sanitize_filename;

/// Parses and sanitizes the filename carried by a Content-Disposition value.
///
/// Returns `None` when the header has no filename or nothing usable survives
/// sanitization (empty, `.` or `..`).
///
/// # Examples
///
/// - `attachment; filename="report.pdf"` → `"report.pdf"`
/// - `attachment; filename*=UTF-8''a%3Fb.txt` → `"a_b.txt"`
pub fn filename_from_content_disposition(header_value: &str) -> Option<String> {
    let raw = parse_content_disposition_filename(header_value)?;
    let sanitized = sanitize_filename(&raw);
    match sanitized.as_str() {
        "" | "." | ".." => None,
        _ => Some(sanitized),
    }
}
