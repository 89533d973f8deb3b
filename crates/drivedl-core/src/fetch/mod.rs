//! HTTP GET over a single curl handle.
//!
//! The handle runs with libcurl's in-memory cookie engine enabled, so a
//! confirmation request automatically carries the cookies set by the first
//! response. Bodies are handed to the caller chunk by chunk, together with the
//! parsed headers of the response they belong to.

mod parse;

use crate::config::DriveConfig;
use crate::error::DriveError;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::str;
use std::time::Duration;
use url::Url;

pub(crate) use parse::parse_headers;

/// Headers of interest from the final response of a redirect chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// Status code from the last status line, if any was parsed.
    pub status: Option<u32>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    /// Raw `Content-Disposition` value (filename hint).
    pub content_disposition: Option<String>,
    /// Raw `Set-Cookie` values from every response in the chain.
    pub set_cookies: Vec<String>,
}

impl ResponseMeta {
    pub fn is_ok(&self) -> bool {
        self.status == Some(200)
    }

    /// An HTML page that is not served as an attachment: either the
    /// "can't scan this file for viruses" interstitial or an error page.
    pub fn looks_like_interstitial(&self) -> bool {
        let html = self
            .content_type
            .as_deref()
            .map(|ct| {
                ct.split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .eq_ignore_ascii_case("text/html")
            })
            .unwrap_or(false);
        html && self.content_disposition.is_none()
    }
}

fn transfer_err(context: &'static str) -> impl FnOnce(curl::Error) -> DriveError {
    move |source| DriveError::Transfer { context, source }
}

/// One curl easy handle reused for every request of a download.
pub struct Session {
    easy: curl::easy::Easy,
}

impl Session {
    pub fn new(cfg: &DriveConfig) -> Result<Self> {
        let mut easy = curl::easy::Easy::new();
        // Empty cookie file: enable the cookie engine without loading anything.
        easy.cookie_file("").context("curl: enable cookie engine")?;
        easy.follow_location(true)?;
        easy.max_redirections(cfg.max_redirections)?;
        easy.useragent(&cfg.user_agent)?;
        easy.buffer_size(cfg.chunk_size)?;
        easy.connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))?;
        easy.low_speed_limit(cfg.low_speed_limit_bytes)?;
        easy.low_speed_time(Duration::from_secs(cfg.low_speed_time_secs))?;
        Ok(Self { easy })
    }

    /// Performs a GET on `url`, calling `on_chunk` for every body chunk.
    ///
    /// Returning `false` from `on_chunk` aborts the transfer; the caller is
    /// expected to remember why. Returns the parsed headers of the final response.
    pub fn get<F>(&mut self, url: &Url, mut on_chunk: F) -> Result<ResponseMeta, DriveError>
    where
        F: FnMut(&ResponseMeta, &[u8]) -> bool,
    {
        self.easy
            .url(url.as_str())
            .map_err(transfer_err("invalid URL"))?;
        self.easy.get(true).map_err(transfer_err("curl setup"))?;

        let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let current: RefCell<Option<ResponseMeta>> = RefCell::new(None);

        {
            let mut transfer = self.easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        headers.borrow_mut().push(s.trim_end().to_string());
                    }
                    current.borrow_mut().take();
                    true
                })
                .map_err(transfer_err("curl setup"))?;
            transfer
                .write_function(|data| {
                    let mut cached = current.borrow_mut();
                    let meta = cached
                        .get_or_insert_with(|| parse_headers(headers.borrow().as_slice()));
                    Ok(if on_chunk(meta, data) { data.len() } else { 0 })
                })
                .map_err(transfer_err("curl setup"))?;
            transfer.perform().map_err(transfer_err("GET request failed"))?;
        }

        let mut meta = parse_headers(headers.into_inner().as_slice());
        let code = self
            .easy
            .response_code()
            .map_err(transfer_err("no response code"))?;
        meta.status = Some(code);
        tracing::debug!(
            url = %url,
            status = code,
            content_type = ?meta.content_type,
            content_length = ?meta.content_length,
            "response received"
        );
        Ok(meta)
    }
}
