//! Parse collected response header lines into `ResponseMeta`.

use super::ResponseMeta;

/// Parses header lines gathered across a redirect chain.
///
/// Each status line (`HTTP/1.1 302 Found`) starts a new response and clears
/// the per-response fields; `Set-Cookie` values accumulate over the whole
/// chain since the cookie engine keeps them too.
pub(crate) fn parse_headers<S: AsRef<str>>(lines: &[S]) -> ResponseMeta {
    let mut meta = ResponseMeta::default();

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            let set_cookies = std::mem::take(&mut meta.set_cookies);
            meta = ResponseMeta {
                status: line.split_whitespace().nth(1).and_then(|c| c.parse().ok()),
                set_cookies,
                ..ResponseMeta::default()
            };
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("set-cookie") {
            meta.set_cookies.push(value.to_string());
        } else if name.eq_ignore_ascii_case("content-type") {
            meta.content_type = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-length") {
            meta.content_length = value.parse().ok();
        } else if name.eq_ignore_ascii_case("content-disposition") {
            meta.content_disposition = Some(value.to_string());
        }
    }

    meta
}
