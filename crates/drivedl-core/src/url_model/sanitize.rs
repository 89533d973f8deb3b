//! Cross-platform filename sanitization.

/// Characters rejected by at least one common filesystem.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest single path component on Linux and most other systems.
const NAME_MAX: usize = 255;

/// Sanitizes a server-supplied filename for use as a single path component.
///
/// - Replaces each of `<>:"/\|?*` and every control character with `_`
///   (one for one; runs are not collapsed)
/// - Trims leading/trailing whitespace
/// - Limits length to 255 bytes on a char boundary
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if ILLEGAL.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim();
    if trimmed.len() <= NAME_MAX {
        return trimmed.to_string();
    }
    let mut take = NAME_MAX;
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}
