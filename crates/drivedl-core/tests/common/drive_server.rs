//! Minimal HTTP/1.1 server emulating the file-sharing endpoints for integration tests.
//!
//! Routes on the `id` query parameter of `/uc`:
//! - `direct`: 200 attachment with a filename
//! - `noname`: 200 binary body without Content-Disposition
//! - `cookie`: warning page + `download_warning_*` cookie; `confirm=<token>` plus the
//!   cookie returns the file
//! - `form`: warning page with a confirm/uuid form pointing at `/download`
//! - `redirect`: 302 to `direct`
//! - `htmlfile`: 200 HTML page with no confirmation at all
//! - `bigpage`: 200 HTML content type, no filename, the file contents as body
//! - `empty`: 200 attachment `e.bin` with an empty body
//! - `missing`: 404 with a longer explanation page
//! - anything else: 404 page
//!
//! `/download?id=form&confirm=t&uuid=<UUID>` returns the file.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const COOKIE_TOKEN: &str = "Xk9qT0k3n";
pub const FORM_UUID: &str = "0a1b2c3d-4e5f-6a7b-8c9d-0e1f2a3b4c5d";
pub const HTML_FILE: &str = "<html><body>just a page</body></html>";
pub const MISSING_PAGE: &str = "File not found. Check the link and try again.";

pub struct DriveServer {
    /// Base URL ending in `/`, e.g. `http://127.0.0.1:12345/`.
    pub base: String,
    requests: Arc<AtomicUsize>,
}

impl DriveServer {
    /// Number of HTTP requests served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body` as the file contents.
/// The server runs until the process exits.
pub fn start(body: Vec<u8>) -> DriveServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &body, &counter));
        }
    });
    DriveServer {
        base: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

struct Request {
    path: String,
    query: HashMap<String, String>,
    cookie: String,
}

fn handle(mut stream: TcpStream, body: &[u8], counter: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(raw) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let Some(req) = parse_request(raw) else {
        return;
    };
    counter.fetch_add(1, Ordering::SeqCst);

    let id = req.query.get("id").map(String::as_str).unwrap_or("");
    match (req.path.as_str(), id) {
        ("/uc", "direct") => send_file(&mut stream, "direct.bin", body),
        ("/uc", "noname") => respond(&mut stream, "200 OK", "application/octet-stream", "", body),
        ("/uc", "redirect") => {
            let location = "Location: /uc?export=download&id=direct\r\n";
            respond(&mut stream, "302 Found", "text/html", location, b"moved");
        }
        ("/uc", "cookie") => {
            let confirmed = req.query.get("confirm").map(String::as_str) == Some(COOKIE_TOKEN)
                && req.cookie.contains(&format!("download_warning_1234_cookie={COOKIE_TOKEN}"));
            if confirmed {
                send_file(&mut stream, "big:file?.iso", body);
            } else {
                let cookie = format!(
                    "Set-Cookie: download_warning_1234_cookie={COOKIE_TOKEN}; Path=/\r\n"
                );
                respond(
                    &mut stream,
                    "200 OK",
                    "text/html; charset=utf-8",
                    &cookie,
                    b"<html>Google Drive can't scan this file for viruses.</html>",
                );
            }
        }
        ("/uc", "form") => {
            let page = format!(
                r#"<html><form id="download-form" action="/download" method="get">
<input type="hidden" name="id" value="form">
<input type="hidden" name="export" value="download">
<input type="hidden" name="confirm" value="t">
<input type="hidden" name="uuid" value="{FORM_UUID}">
</form></html>"#
            );
            respond(&mut stream, "200 OK", "text/html; charset=utf-8", "", page.as_bytes());
        }
        ("/download", "form")
            if req.query.get("confirm").map(String::as_str) == Some("t")
                && req.query.get("uuid").map(String::as_str) == Some(FORM_UUID) =>
        {
            let disposition =
                "Content-Disposition: attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf\r\n";
            respond(&mut stream, "200 OK", "application/pdf", disposition, body);
        }
        ("/uc", "htmlfile") => {
            respond(&mut stream, "200 OK", "text/html", "", HTML_FILE.as_bytes())
        }
        ("/uc", "bigpage") => respond(&mut stream, "200 OK", "text/html", "", body),
        ("/uc", "empty") => send_file(&mut stream, "e.bin", b""),
        ("/uc", "missing") => respond(
            &mut stream,
            "404 Not Found",
            "text/html",
            "",
            MISSING_PAGE.as_bytes(),
        ),
        _ => respond(&mut stream, "404 Not Found", "text/html", "", b"Not Found"),
    }
}

fn send_file(stream: &mut TcpStream, name: &str, body: &[u8]) {
    let disposition = format!("Content-Disposition: attachment; filename=\"{name}\"\r\n");
    respond(stream, "200 OK", "application/octet-stream", &disposition, body);
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, extra: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        status,
        content_type,
        body.len(),
        extra
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn parse_request(raw: &str) -> Option<Request> {
    let mut lines = raw.lines();
    let target = lines.next()?.split_whitespace().nth(1)?;
    let url = url::Url::parse(&format!("http://localhost{target}")).ok()?;
    let mut cookie = String::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("cookie") {
                cookie = value.trim().to_string();
            }
        }
    }
    Some(Request {
        path: url.path().to_string(),
        query: url.query_pairs().into_owned().collect(),
        cookie,
    })
}
