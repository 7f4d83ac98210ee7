use std::collections::BTreeMap;

use serde::Serialize;

/// Header name to value, with repeated names joined by `", "`.
pub type HeaderMap = BTreeMap<String, String>;

/// One observed request/response pair.
///
/// Fields are private and there are no setters: a record only comes into
/// existence through [`crate::TrafficStore::store`], which assigns the id.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapturedExchange {
    id: u64,
    timestamp: i64,
    method: String,
    url: String,
    host: String,
    port: u16,
    is_https: bool,
    request_headers: HeaderMap,
    request_body: String,
    status_code: u16,
    response_headers: HeaderMap,
    response_body: String,
    mime_type: String,
    tool_source: String,
}

impl CapturedExchange {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Capture time in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_https(&self) -> bool {
        self.is_https
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    pub fn request_body(&self) -> &str {
        &self.request_body
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn response_body(&self) -> &str {
        &self.response_body
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Host subsystem that produced the exchange (proxy, repeater, ...).
    pub fn tool_source(&self) -> &str {
        &self.tool_source
    }
}

/// Staged construction of a [`CapturedExchange`].
///
/// The builder carries everything except the id. The timestamp defaults to
/// the moment the builder was created.
#[derive(Clone, Debug)]
pub struct RecordBuilder {
    timestamp: i64,
    method: String,
    url: String,
    host: String,
    port: u16,
    is_https: bool,
    request_headers: HeaderMap,
    request_body: String,
    status_code: u16,
    response_headers: HeaderMap,
    response_body: String,
    mime_type: String,
    tool_source: String,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self {
            timestamp: now_millis(),
            method: String::new(),
            url: String::new(),
            host: String::new(),
            port: 0,
            is_https: false,
            request_headers: HeaderMap::new(),
            request_body: String::new(),
            status_code: 0,
            response_headers: HeaderMap::new(),
            response_body: String::new(),
            mime_type: String::new(),
            tool_source: String::new(),
        }
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn https(mut self, is_https: bool) -> Self {
        self.is_https = is_https;
        self
    }

    pub fn request_headers(mut self, headers: HeaderMap) -> Self {
        self.request_headers = headers;
        self
    }

    pub fn request_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = body.into();
        self
    }

    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn response_headers(mut self, headers: HeaderMap) -> Self {
        self.response_headers = headers;
        self
    }

    pub fn response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = body.into();
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn tool_source(mut self, tool_source: impl Into<String>) -> Self {
        self.tool_source = tool_source.into();
        self
    }

    /// Partition key the finished record will be stored under.
    pub fn partition_key(&self) -> String {
        partition_key(&self.host)
    }

    pub(crate) fn build(self, id: u64) -> CapturedExchange {
        CapturedExchange {
            id,
            timestamp: self.timestamp,
            method: self.method,
            url: self.url,
            host: self.host,
            port: self.port,
            is_https: self.is_https,
            request_headers: self.request_headers,
            request_body: self.request_body,
            status_code: self.status_code,
            response_headers: self.response_headers,
            response_body: self.response_body,
            mime_type: self.mime_type,
            tool_source: self.tool_source,
        }
    }
}

/// Lower-cased host name used to bucket records.
pub fn partition_key(host: &str) -> String {
    host.trim().to_lowercase()
}

/// Collapse a header list into a map, joining repeated names in arrival order.
pub fn coalesce_headers<I, K, V>(headers: I) -> HeaderMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.entry(name.into())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value.as_ref());
            })
            .or_insert_with(|| value.as_ref().to_string());
    }
    map
}

/// Current wall-clock time in epoch milliseconds, or 0 if the clock is
/// before the epoch.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|value| value.as_millis() as i64)
        .unwrap_or(0)
}
