use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tapbridge_rpc::{RpcOutcome, RpcRequest, RpcResponse};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, AUTHORIZATION};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
const CLOSE_WAIT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub auth_token: Option<String>,
    pub call_timeout: Duration,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), auth_token: None, call_timeout: DEFAULT_CALL_TIMEOUT }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

#[derive(Clone, Debug)]
struct CloseInfo {
    code: Option<u16>,
    reason: String,
}

#[derive(Default)]
struct Pending {
    waiters: HashMap<String, oneshot::Sender<RpcResponse>>,
    closed: Option<CloseInfo>,
}

/// A connection to a tapbridge endpoint.
///
/// Calls may be issued concurrently from several tasks; replies are matched
/// to callers by request id.
pub struct RpcClient {
    sink: tokio::sync::Mutex<SplitSink<WsStream, Message>>,
    pending: Arc<Mutex<Pending>>,
    next_id: AtomicU64,
    call_timeout: Duration,
    reader: Option<JoinHandle<()>>,
}

impl RpcClient {
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let mut request = config.url.as_str().into_client_request().map_err(|source| {
            ClientError::Connect { url: config.url.clone(), source: Box::new(source) }
        })?;
        if let Some(token) = &config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ClientError::invalid_request("auth token is not a valid header value")
            })?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws, _) = tokio_tungstenite::connect_async(request).await.map_err(|source| {
            ClientError::Connect { url: config.url.clone(), source: Box::new(source) }
        })?;
        log::debug!("rpc-client: connected to {}", config.url);

        let (sink, stream) = ws.split();
        let pending = Arc::new(Mutex::new(Pending::default()));
        let reader = tokio::spawn(read_replies(stream, Arc::clone(&pending)));
        Ok(Self {
            sink: tokio::sync::Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            call_timeout: config.call_timeout,
            reader: Some(reader),
        })
    }

    /// Invoke `method` and return its `result` member.
    ///
    /// `params` must be a JSON object or `null`.
    pub async fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, ClientError> {
        let params = match params {
            JsonValue::Object(params) => params,
            JsonValue::Null => serde_json::Map::new(),
            _ => return Err(ClientError::invalid_request("params must be a JSON object")),
        };
        let id = format!("c-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = RpcRequest::new(id.clone(), method).with_params(params);

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock();
            if let Some(closed) = &pending.closed {
                return Err(closed_error(closed));
            }
            pending.waiters.insert(id.clone(), tx);
        }

        let frame = Message::Text(request.to_value().to_string());
        let sent = self.sink.lock().await.send(frame).await;
        if let Err(err) = sent {
            let mut pending = self.pending.lock();
            pending.waiters.remove(&id);
            return Err(match &pending.closed {
                Some(closed) => closed_error(closed),
                None => err.into(),
            });
        }

        let response = match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(self.closed_reason()),
            Err(_) => {
                self.pending.lock().waiters.remove(&id);
                return Err(ClientError::Timeout {
                    method: method.to_string(),
                    after: self.call_timeout,
                });
            }
        };
        match response.outcome {
            RpcOutcome::Result(result) => Ok(result),
            RpcOutcome::Error(error) => {
                Err(ClientError::Rpc { code: error.code, message: error.message })
            }
        }
    }

    /// Like [`RpcClient::call`], decoding the result into `T`.
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: JsonValue,
    ) -> Result<T, ClientError> {
        let result = self.call(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Close the connection politely and wait for the server to confirm.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.lock().await.close().await?;
        if let Some(reader) = self.reader.as_mut() {
            if tokio::time::timeout(CLOSE_WAIT, reader).await.is_err() {
                log::debug!("rpc-client: server did not confirm close");
            }
        }
        Ok(())
    }

    /// Whether the server has closed the connection.
    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed.is_some()
    }

    fn closed_reason(&self) -> ClientError {
        match &self.pending.lock().closed {
            Some(closed) => closed_error(closed),
            None => ClientError::Closed { code: None, reason: "connection lost".into() },
        }
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

fn closed_error(closed: &CloseInfo) -> ClientError {
    ClientError::Closed { code: closed.code, reason: closed.reason.clone() }
}

async fn read_replies(mut stream: SplitStream<WsStream>, pending: Arc<Mutex<Pending>>) {
    let mut close = CloseInfo { code: None, reason: "connection lost".into() };
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => deliver(&text, &pending),
            Ok(Message::Close(frame)) => {
                if let Some(frame) = frame {
                    close = CloseInfo {
                        code: Some(u16::from(frame.code)),
                        reason: frame.reason.into_owned(),
                    };
                }
                break;
            }
            Ok(_) => {}
            Err(err) => {
                close.reason = err.to_string();
                break;
            }
        }
    }
    log::debug!("rpc-client: connection closed ({:?}): {}", close.code, close.reason);

    let mut pending = pending.lock();
    pending.closed = Some(close);
    // dropping the senders wakes every waiting caller
    pending.waiters.clear();
}

fn deliver(text: &str, pending: &Mutex<Pending>) {
    let response = serde_json::from_str::<JsonValue>(text)
        .ok()
        .and_then(|value| RpcResponse::from_value(&value));
    let Some(response) = response else {
        log::warn!("rpc-client: discarding malformed reply");
        return;
    };
    let waiter = response.id.as_ref().and_then(|id| pending.lock().waiters.remove(id));
    match waiter {
        Some(waiter) => {
            let _ = waiter.send(response);
        }
        None => log::debug!("rpc-client: reply for unknown id {:?}", response.id),
    }
}
