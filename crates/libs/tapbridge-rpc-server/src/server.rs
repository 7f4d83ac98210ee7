use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tapbridge_rpc::Dispatcher;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

use crate::auth::BearerAuth;
use crate::error::ServerError;

/// Close code sent to clients that fail the bearer check.
pub const UNAUTHORIZED_CLOSE_CODE: u16 = 4001;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_LINGER: Duration = Duration::from_secs(2);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Loopback port; 0 picks an ephemeral one.
    pub port: u16,
    /// Shared secret; empty disables authentication.
    pub auth_token: String,
}

/// A bound, not yet serving, transport endpoint.
pub struct RpcServer {
    listener: TcpListener,
    auth: Arc<BearerAuth>,
    dispatcher: Arc<Dispatcher>,
}

impl RpcServer {
    /// Bind `127.0.0.1:<port>`. Nothing is accepted until [`RpcServer::spawn`].
    pub async fn bind(
        config: ServerConfig,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Self, ServerError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
        let listener =
            TcpListener::bind(addr).await.map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self { listener, auth: Arc::new(BearerAuth::new(&config.auth_token)), dispatcher })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the accept loop on the current runtime.
    pub fn spawn(self) -> Result<ServerHandle, ServerError> {
        let local_addr = self.local_addr()?;
        let cancel = CancellationToken::new();
        log::info!(
            "rpc-server: listening on ws://{} (auth {})",
            local_addr,
            if self.auth.is_enabled() { "required" } else { "disabled" }
        );
        let task = tokio::spawn(accept_loop(self, cancel.clone()));
        Ok(ServerHandle { local_addr, cancel, task: Some(task) })
    }
}

/// Running server. Dropping the handle cancels the server without waiting.
pub struct ServerHandle {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, close every open connection and release the port.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                log::warn!("rpc-server: accept loop ended abnormally: {}", err);
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn accept_loop(server: RpcServer, cancel: CancellationToken) {
    let RpcServer { listener, auth, dispatcher } = server;
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        Arc::clone(&auth),
                        Arc::clone(&dispatcher),
                        cancel.child_token(),
                    ));
                }
                Err(err) => log::warn!("rpc-server: accept failed: {}", err),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    let drain = async { while connections.join_next().await.is_some() {} };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        log::warn!("rpc-server: aborting {} connections that did not close", connections.len());
        connections.abort_all();
        while connections.join_next().await.is_some() {}
    }
    log::info!("rpc-server: stopped");
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    auth: Arc<BearerAuth>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) {
    let mut presented: Option<String> = None;
    let capture_authorization = |request: &Request, response: Response| {
        presented = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok::<Response, ErrorResponse>(response)
    };

    let handshake = tokio::time::timeout(
        HANDSHAKE_TIMEOUT,
        tokio_tungstenite::accept_hdr_async(stream, capture_authorization),
    );
    let mut ws = match handshake.await {
        Ok(Ok(ws)) => ws,
        Ok(Err(err)) => {
            log::debug!("rpc-server: handshake with {} failed: {}", peer, err);
            return;
        }
        Err(_) => {
            log::debug!("rpc-server: handshake with {} timed out", peer);
            return;
        }
    };

    if !auth.verify(presented.as_deref()) {
        log::warn!("rpc-server: rejected {}: invalid token", peer);
        close(&mut ws, CloseCode::from(UNAUTHORIZED_CLOSE_CODE), "Unauthorized").await;
        return;
    }
    log::info!("rpc-server: client connected from {}", peer);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                close(&mut ws, CloseCode::Normal, "server shutting down").await;
                break;
            }
            message = ws.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let reply = tokio::select! {
                        reply = dispatcher.handle(&text) => reply,
                        _ = cancel.cancelled() => {
                            log::debug!("rpc-server: dropping in-flight call from {}", peer);
                            close(&mut ws, CloseCode::Normal, "server shutting down").await;
                            break;
                        }
                    };
                    if let Err(err) = ws.send(Message::Text(reply)).await {
                        log::debug!("rpc-server: send to {} failed: {}", peer, err);
                        break;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    log::debug!(
                        "rpc-server: ignoring {} byte binary frame from {}",
                        data.len(),
                        peer
                    );
                }
                // keep polling so the close reply is flushed; the stream then ends
                Some(Ok(Message::Close(_))) => {}
                None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    log::debug!("rpc-server: connection to {} failed: {}", peer, err);
                    break;
                }
            },
        }
    }
    log::info!("rpc-server: client {} disconnected", peer);
}

/// Send a close frame and wait briefly for the peer to acknowledge it.
async fn close(ws: &mut WebSocketStream<TcpStream>, code: CloseCode, reason: &'static str) {
    let frame = CloseFrame { code, reason: reason.into() };
    if ws.close(Some(frame)).await.is_err() {
        return;
    }
    let drain = async { while let Some(Ok(_)) = ws.next().await {} };
    let _ = tokio::time::timeout(CLOSE_LINGER, drain).await;
}
