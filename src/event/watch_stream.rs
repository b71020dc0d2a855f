//! Kubernetes watch-stream source
//!
//! Reads the line-delimited JSON produced by a watch request, for example
//! `kubectl get --raw '/api/v1/pods?watch=true'`:
//!
//! ```text
//! {"type":"ADDED","object":{"kind":"Pod","metadata":{...},"status":{...}}}
//! {"type":"MODIFIED","object":{...}}
//! ```
//!
//! Watch events only carry the new object. A last-seen cache keyed by
//! `<namespace>/<name>` supplies the previous snapshot, the way an informer's
//! store does.

use crate::event::{ChangeEvent, EventSource};
use crate::resource::WatchedResource;
use crate::utils::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
    Bookmark,
    Error,
}

/// A decoded watch line
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent<R> {
    Added(R),
    Modified(R),
    Deleted(R),
    Bookmark,
    /// Server-side watch error (`Status` object message)
    Error(String),
}

#[derive(Debug, Deserialize)]
struct RawWatchEvent {
    #[serde(rename = "type")]
    event_type: WatchEventType,
    #[serde(default)]
    object: serde_json::Value,
}

/// Decode one watch line into a typed event.
///
/// # Errors
///
/// `SerializationFailure` when the line is not a watch event or the object does
/// not match the resource schema.
pub fn decode_watch_line<R: WatchedResource>(line: &str) -> Result<WatchEvent<R>, AppError> {
    let raw: RawWatchEvent = serde_json::from_str(line)?;

    let decode = |object: serde_json::Value| -> Result<R, AppError> {
        serde_json::from_value(object).map_err(|e| {
            AppError::serialization(format!("{} object does not match schema: {}", R::KIND, e))
        })
    };

    Ok(match raw.event_type {
        WatchEventType::Added => WatchEvent::Added(decode(raw.object)?),
        WatchEventType::Modified => WatchEvent::Modified(decode(raw.object)?),
        WatchEventType::Deleted => WatchEvent::Deleted(decode(raw.object)?),
        WatchEventType::Bookmark => WatchEvent::Bookmark,
        WatchEventType::Error => WatchEvent::Error(
            raw.object
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown watch error")
                .to_string(),
        ),
    })
}

/// Decode one raw watch line; blank lines yield `None`
fn decode_watch_bytes<R: WatchedResource>(bytes: &[u8]) -> Result<Option<WatchEvent<R>>, AppError> {
    let line = std::str::from_utf8(bytes)
        .map_err(|e| AppError::serialization(format!("watch line is not valid UTF-8: {}", e)))?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    decode_watch_line(line).map(Some)
}

/// Event source over a watch stream
///
/// Only I/O errors end the stream. Lines that cannot be decoded, invalid UTF-8
/// included, are counted and skipped.
pub struct WatchStreamSource<R, B> {
    reader: B,
    buf: Vec<u8>,
    /// Last seen snapshot per object key
    cache: HashMap<String, R>,
    decode_failures: u64,
}

impl<R, B> WatchStreamSource<R, B>
where
    R: WatchedResource,
    B: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: B) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            cache: HashMap::new(),
            decode_failures: 0,
        }
    }

    /// Number of objects currently known
    pub fn cached_objects(&self) -> usize {
        self.cache.len()
    }

    /// Lines skipped because they could not be decoded
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }

    /// Fold a watch event into the cache and derive the change event, if any
    fn apply(&mut self, event: WatchEvent<R>) -> Option<ChangeEvent<R>> {
        match event {
            WatchEvent::Added(obj) | WatchEvent::Modified(obj) => {
                match self.cache.insert(obj.key(), obj.clone()) {
                    Some(old) => Some(ChangeEvent::Modified { old, new: obj }),
                    None => Some(ChangeEvent::Added(obj)),
                }
            }
            WatchEvent::Deleted(obj) => {
                let last_known = self.cache.remove(&obj.key()).unwrap_or(obj);
                Some(ChangeEvent::Deleted(last_known))
            }
            WatchEvent::Bookmark => {
                debug!("Watch bookmark received");
                None
            }
            WatchEvent::Error(message) => {
                warn!(message = %message, "Watch stream reported an error");
                None
            }
        }
    }
}

#[async_trait]
impl<R, B> EventSource<R> for WatchStreamSource<R, B>
where
    R: WatchedResource,
    B: AsyncBufRead + Unpin + Send,
{
    async fn next_event(&mut self) -> Option<ChangeEvent<R>> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) => {
                    debug!(cached = self.cache.len(), "Watch stream ended");
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Failed to read watch stream");
                    return None;
                }
            }

            match decode_watch_bytes::<R>(&self.buf) {
                Ok(None) => continue,
                Ok(Some(event)) => {
                    if let Some(change) = self.apply(event) {
                        return Some(change);
                    }
                }
                Err(e) => {
                    self.decode_failures += 1;
                    warn!(
                        error_code = e.error_code(),
                        error = %e,
                        "Dropping undecodable watch line"
                    );
                }
            }
        }
    }
}
