//! Large-file confirmation handling.
//!
//! Files too large to virus-scan are not served directly. The service answers
//! the first request with a warning page and one of two confirmation carriers:
//! - a `download_warning*` cookie whose value is the token for `confirm=`
//! - an HTML form holding `confirm` and `uuid` fields, posted to a separate
//!   download host

use crate::config::DriveConfig;
use crate::link::FileId;
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Cookie name prefix carrying the confirmation token.
pub const WARNING_COOKIE_PREFIX: &str = "download_warning";

static CONFIRM_INPUT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="confirm"\s+value="([^"]*)""#).expect("confirm input regex is valid")
});

static CONFIRM_PARAM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&;]confirm=([0-9A-Za-z_-]+)").expect("confirm param regex is valid")
});

static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([0-9a-z]{8}-[0-9a-z]{4}-[0-9a-z]{4}-[0-9a-z]{4}-[0-9a-z]{12})""#)
        .expect("uuid regex is valid")
});

/// Confirmation values scraped from the warning page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfirmation {
    pub confirm: String,
    pub uuid: Option<String>,
}

/// What the second request must carry to get the actual file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Cookie(String),
    Form(FormConfirmation),
}

/// URL of the first request: `<download_url>?export=download&id=<ID>`.
pub fn download_url(cfg: &DriveConfig, id: &FileId) -> Result<Url> {
    Url::parse_with_params(
        &cfg.download_url,
        &[("export", "download"), ("id", id.as_str())],
    )
    .with_context(|| format!("invalid download_url {}", cfg.download_url))
}

impl Confirmation {
    /// URL of the confirmed (second) request.
    pub fn request_url(&self, cfg: &DriveConfig, id: &FileId) -> Result<Url> {
        match self {
            Confirmation::Cookie(token) => {
                let mut url = download_url(cfg, id)?;
                url.query_pairs_mut().append_pair("confirm", token);
                Ok(url)
            }
            Confirmation::Form(form) => {
                let mut url = Url::parse_with_params(
                    &cfg.confirm_url,
                    &[
                        ("id", id.as_str()),
                        ("export", "download"),
                        ("confirm", form.confirm.as_str()),
                    ],
                )
                .with_context(|| format!("invalid confirm_url {}", cfg.confirm_url))?;
                if let Some(uuid) = &form.uuid {
                    url.query_pairs_mut().append_pair("uuid", uuid);
                }
                Ok(url)
            }
        }
    }
}

/// Returns the value of the first `download_warning*` cookie, if any.
pub fn token_from_set_cookies<S: AsRef<str>>(set_cookies: &[S]) -> Option<String> {
    set_cookies.iter().find_map(|raw| {
        let pair = raw.as_ref().split(';').next()?;
        let (name, value) = pair.split_once('=')?;
        name.trim()
            .starts_with(WARNING_COOKIE_PREFIX)
            .then(|| value.trim().to_string())
    })
}

/// Scrapes confirmation values from a warning page.
///
/// Returns `None` unless the page carries a `confirm` value or a download UUID.
/// A missing `confirm` defaults to `t`.
pub fn form_from_html(body: &str) -> Option<FormConfirmation> {
    let confirm = CONFIRM_INPUT_REGEX
        .captures(body)
        .or_else(|| CONFIRM_PARAM_REGEX.captures(body))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty());
    let uuid = UUID_REGEX
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    if confirm.is_none() && uuid.is_none() {
        return None;
    }
    Some(FormConfirmation {
        confirm: confirm.unwrap_or_else(|| "t".to_string()),
        uuid,
    })
}
