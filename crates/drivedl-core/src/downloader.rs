//! Download orchestration: first request, optional confirmed request, stream to disk.
//!
//! At most two GETs are issued. The body of the first response is only
//! streamed to disk when it is unmistakably the file (200, no confirmation
//! cookie, not an HTML warning page); otherwise it is held in memory so it can
//! be scanned for a confirmation form or reported as an error.

use crate::config::DriveConfig;
use crate::confirm::{self, Confirmation};
use crate::destination::{resolve_destination, DestinationNote, ResolvedDestination};
use crate::error::DriveError;
use crate::fetch::{ResponseMeta, Session};
use crate::link::FileId;
use crate::storage::StorageWriter;
use crate::url_model::filename_from_content_disposition;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Where the file was written.
    pub path: PathBuf,
    pub bytes_written: u64,
    /// True when a confirmation request was needed.
    pub confirmed: bool,
    /// Set when the path was not derived from the server filename.
    pub note: Option<DestinationNote>,
}

/// Downloads the file identified by `file_id`.
///
/// `destination` is interpreted by [`resolve_destination`] relative to `cwd`.
/// Errors are `DriveError` values wrapped in `anyhow` for the classified cases.
pub fn download(
    file_id: &FileId,
    destination: Option<&Path>,
    cwd: &Path,
    cfg: &DriveConfig,
) -> Result<DownloadOutcome> {
    let mut session = Session::new(cfg)?;

    let url = confirm::download_url(cfg, file_id)?;
    tracing::info!(%file_id, %url, "requesting file");
    let mut first = BodyHandler::new(cfg, destination, cwd, true);
    let result = session.get(&url, |meta, data| first.on_chunk(meta, data));
    let (meta, settled) = first.settle(result)?;

    let body = match settled {
        Settled::Streamed(writer, dest) => return finish(writer, dest, false),
        Settled::Buffered(body) => body,
    };

    if let Some(confirmation) = detect_confirmation(&meta, &body) {
        let url = confirmation.request_url(cfg, file_id)?;
        tracing::info!(?confirmation, %url, "confirmation required, requesting again");
        let mut second = BodyHandler::new(cfg, destination, cwd, false);
        let result = session.get(&url, |meta, data| second.on_chunk(meta, data));
        return match second.settle(result)? {
            (_, Settled::Streamed(writer, dest)) => finish(writer, dest, true),
            (meta, Settled::Buffered(body)) => Err(status_error(&meta, &body).into()),
        };
    }

    if !meta.is_ok() {
        return Err(status_error(&meta, &body).into());
    }

    // A 200 HTML page with nothing to confirm is kept as the file.
    tracing::warn!("no confirmation found on HTML response, saving it as the file");
    let (mut writer, dest) = start_file(&meta, destination, cwd)?;
    if let Err(e) = writer.write_chunk(&body) {
        writer.discard();
        return Err(write_error(dest.path, e).into());
    }
    finish(writer, dest, false)
}

/// Cookie token first; the HTML form only on a 200 warning page.
fn detect_confirmation(meta: &ResponseMeta, body: &[u8]) -> Option<Confirmation> {
    if let Some(token) = confirm::token_from_set_cookies(&meta.set_cookies) {
        return Some(Confirmation::Cookie(token));
    }
    if meta.is_ok() && meta.looks_like_interstitial() {
        return confirm::form_from_html(&String::from_utf8_lossy(body)).map(Confirmation::Form);
    }
    None
}

fn finish(
    writer: StorageWriter,
    dest: ResolvedDestination,
    confirmed: bool,
) -> Result<DownloadOutcome> {
    let bytes_written = match writer.finalize() {
        Ok(n) => n,
        Err(e) => return Err(write_error(dest.path, e).into()),
    };
    tracing::info!(path = %dest.path.display(), bytes_written, confirmed, "download complete");
    Ok(DownloadOutcome {
        path: dest.path,
        bytes_written,
        confirmed,
        note: dest.note,
    })
}

fn status_error(meta: &ResponseMeta, body: &[u8]) -> DriveError {
    DriveError::HttpStatus {
        code: meta.status.unwrap_or(0),
        body: String::from_utf8_lossy(body).trim().to_string(),
    }
}

fn write_error(path: PathBuf, e: anyhow::Error) -> DriveError {
    DriveError::Write {
        path,
        source: e.into(),
    }
}

/// Resolves the output path from the response headers and opens the writer.
fn start_file(
    meta: &ResponseMeta,
    destination: Option<&Path>,
    cwd: &Path,
) -> Result<(StorageWriter, ResolvedDestination), DriveError> {
    let server_name = meta
        .content_disposition
        .as_deref()
        .and_then(filename_from_content_disposition);
    let dest = resolve_destination(destination, server_name.as_deref(), cwd)
        .map_err(|e| write_error(destination.unwrap_or(cwd).to_path_buf(), e))?;
    if let Some(note) = dest.note {
        tracing::warn!("{}", note.message(&dest.path));
    }
    let writer =
        StorageWriter::create(&dest.path).map_err(|e| write_error(dest.path.clone(), e))?;
    Ok((writer, dest))
}

enum Sink {
    /// No body byte seen yet.
    Pending,
    Buffer(Vec<u8>),
    File(StorageWriter, ResolvedDestination),
    Failed(DriveError),
}

enum Settled {
    Streamed(StorageWriter, ResolvedDestination),
    Buffered(Vec<u8>),
}

/// Routes body chunks of one response to memory or to disk.
struct BodyHandler<'a> {
    destination: Option<&'a Path>,
    cwd: &'a Path,
    buffer_limit: usize,
    /// First request only: hold back warning pages and cookie-confirmed responses.
    expect_interstitial: bool,
    sink: Sink,
}

impl<'a> BodyHandler<'a> {
    fn new(
        cfg: &DriveConfig,
        destination: Option<&'a Path>,
        cwd: &'a Path,
        expect_interstitial: bool,
    ) -> Self {
        Self {
            destination,
            cwd,
            buffer_limit: cfg.interstitial_limit_bytes,
            expect_interstitial,
            sink: Sink::Pending,
        }
    }

    /// A buffered 200 response without a confirmation cookie that outgrew the
    /// buffer is the file itself.
    fn may_promote(meta: &ResponseMeta) -> bool {
        meta.is_ok() && confirm::token_from_set_cookies(&meta.set_cookies).is_none()
    }

    /// Returns false to abort the transfer.
    fn on_chunk(&mut self, meta: &ResponseMeta, data: &[u8]) -> bool {
        if let Sink::Pending = self.sink {
            self.sink = if streams(meta, self.expect_interstitial) {
                match start_file(meta, self.destination, self.cwd) {
                    Ok((writer, dest)) => Sink::File(writer, dest),
                    Err(e) => Sink::Failed(e),
                }
            } else {
                Sink::Buffer(Vec::new())
            };
        }

        let failure = match &mut self.sink {
            Sink::Buffer(buf) => {
                if buf.len() + data.len() <= self.buffer_limit {
                    buf.extend_from_slice(data);
                    return true;
                }
                if !Self::may_promote(meta) {
                    let room = self.buffer_limit.saturating_sub(buf.len());
                    buf.extend_from_slice(&data[..room]);
                    return true;
                }
                tracing::debug!(
                    "HTML response exceeds {} bytes, streaming it as the file",
                    self.buffer_limit
                );
                let held = std::mem::take(buf);
                match start_file(meta, self.destination, self.cwd) {
                    Ok((mut writer, dest)) => match writer
                        .write_chunk(&held)
                        .and_then(|()| writer.write_chunk(data))
                    {
                        Ok(()) => {
                            self.sink = Sink::File(writer, dest);
                            return true;
                        }
                        Err(e) => {
                            writer.discard();
                            write_error(dest.path, e)
                        }
                    },
                    Err(e) => e,
                }
            }
            Sink::File(writer, dest) => match writer.write_chunk(data) {
                Ok(()) => return true,
                Err(e) => write_error(dest.path.clone(), e),
            },
            Sink::Failed(_) | Sink::Pending => return false,
        };

        if let Sink::File(writer, _) = std::mem::replace(&mut self.sink, Sink::Failed(failure)) {
            writer.discard();
        }
        false
    }

    /// Combines the transfer result with the sink state.
    fn settle(
        self,
        result: Result<ResponseMeta, DriveError>,
    ) -> Result<(ResponseMeta, Settled), DriveError> {
        let meta = match (result, self.sink) {
            (_, Sink::Failed(e)) => return Err(e),
            (Err(e), Sink::File(writer, _)) => {
                writer.discard();
                return Err(e);
            }
            (Err(e), _) => return Err(e),
            (Ok(meta), Sink::File(writer, dest)) => {
                return Ok((meta, Settled::Streamed(writer, dest)))
            }
            (Ok(meta), Sink::Buffer(body)) => return Ok((meta, Settled::Buffered(body))),
            (Ok(meta), Sink::Pending) => meta,
        };

        // Empty body: nothing reached on_chunk.
        if streams(&meta, self.expect_interstitial) {
            let (writer, dest) = start_file(&meta, self.destination, self.cwd)?;
            Ok((meta, Settled::Streamed(writer, dest)))
        } else {
            Ok((meta, Settled::Buffered(Vec::new())))
        }
    }
}

/// Whether a response body goes straight to disk.
fn streams(meta: &ResponseMeta, expect_interstitial: bool) -> bool {
    if !meta.is_ok() {
        return false;
    }
    !expect_interstitial
        || (confirm::token_from_set_cookies(&meta.set_cookies).is_none()
            && !meta.looks_like_interstitial())
}
