//! Write path from host traffic notifications into the [`TrafficStore`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::CaptureError;
use crate::record::{coalesce_headers, RecordBuilder};
use crate::store::TrafficStore;

/// Body ceiling applied when nothing else is configured (100 KiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 102_400;

/// Request half of an exchange as reported by the host.
#[derive(Clone, Debug, Default)]
pub struct ObservedRequest {
    pub method: String,
    pub url: String,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Response half of an exchange as reported by the host.
#[derive(Clone, Debug, Default)]
pub struct ObservedResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub mime_type: String,
}

/// One exchange handed over by the host's traffic notification hook.
#[derive(Clone, Debug, Default)]
pub struct ObservedExchange {
    pub request: ObservedRequest,
    pub response: Option<ObservedResponse>,
    pub tool_source: String,
    /// Capture time in epoch milliseconds; `None` means "now".
    pub observed_at_ms: Option<i64>,
}

#[derive(Debug, Default)]
pub struct RecorderStats {
    pub captured: AtomicU64,
    pub failed: AtomicU64,
}

impl RecorderStats {
    pub fn snapshot(&self) -> RecorderStatsSnapshot {
        RecorderStatsSnapshot {
            captured: self.captured.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecorderStatsSnapshot {
    pub captured: u64,
    pub failed: u64,
}

/// Ingestion adapter: builds records from host exchanges and stores them.
///
/// `record` is synchronous and never fails outward, so it can be called
/// directly from the host's traffic callback on any thread.
#[derive(Debug)]
pub struct TrafficRecorder {
    store: Arc<TrafficStore>,
    max_body_size: usize,
    stats: RecorderStats,
}

impl TrafficRecorder {
    pub fn new(store: Arc<TrafficStore>, max_body_size: usize) -> Self {
        Self { store, max_body_size, stats: RecorderStats::default() }
    }

    pub fn store(&self) -> &Arc<TrafficStore> {
        &self.store
    }

    pub fn stats(&self) -> &RecorderStats {
        &self.stats
    }

    /// Validate `exchange` and stage a record for it. Bodies are truncated
    /// independently to the configured ceiling.
    pub fn prepare(&self, exchange: &ObservedExchange) -> Result<RecordBuilder, CaptureError> {
        let request = &exchange.request;
        let response = exchange
            .response
            .as_ref()
            .ok_or_else(|| CaptureError::MissingResponse { url: request.url.clone() })?;
        if request.host.trim().is_empty() {
            return Err(CaptureError::MissingHost { url: request.url.clone() });
        }
        if request.method.trim().is_empty() {
            return Err(CaptureError::MissingMethod { url: request.url.clone() });
        }

        let mut builder = RecordBuilder::new()
            .method(request.method.as_str())
            .url(request.url.as_str())
            .host(request.host.as_str())
            .port(request.port)
            .https(request.secure)
            .request_headers(coalesce_headers(
                request.headers.iter().map(|(name, value)| (name.as_str(), value.as_str())),
            ))
            .request_body(truncate_body(&request.body, self.max_body_size))
            .status_code(response.status_code)
            .response_headers(coalesce_headers(
                response.headers.iter().map(|(name, value)| (name.as_str(), value.as_str())),
            ))
            .response_body(truncate_body(&response.body, self.max_body_size))
            .mime_type(response.mime_type.as_str())
            .tool_source(exchange.tool_source.as_str());
        if let Some(timestamp) = exchange.observed_at_ms {
            builder = builder.timestamp(timestamp);
        }
        Ok(builder)
    }

    /// Store `exchange`, returning its id. Malformed exchanges are logged and
    /// dropped; capture must never interrupt the host's traffic pipeline.
    pub fn record(&self, exchange: &ObservedExchange) -> Option<u64> {
        match self.prepare(exchange) {
            Ok(builder) => {
                let id = self.store.store(builder);
                self.stats.captured.fetch_add(1, Ordering::Relaxed);
                log::trace!("capture: stored #{} {}", id, exchange.request.url);
                Some(id)
            }
            Err(err) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                log::warn!("capture: error storing request: {}", err);
                None
            }
        }
    }
}

/// Decode `body` as text and cut it to at most `ceiling` bytes.
///
/// The cut lands on a char boundary and is followed by a marker recording
/// the full decoded length, e.g. `"\n[TRUNCATED - 2048 bytes total]"`.
pub fn truncate_body(body: &[u8], ceiling: usize) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= ceiling {
        return text.into_owned();
    }
    let mut cut = ceiling;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}\n[TRUNCATED - {} bytes total]", &text[..cut], text.len())
}
