//! Loopback WebSocket transport for the bridge's JSON-RPC surface.
//!
//! One text frame carries one request; the reply goes back on the same
//! connection before the next frame is read. When a shared secret is set,
//! the handshake must carry `Authorization: Bearer <secret>` or the
//! connection is closed with code 4001.

pub mod auth;
pub mod error;
pub mod server;

pub use auth::BearerAuth;
pub use error::ServerError;
pub use server::{RpcServer, ServerConfig, ServerHandle, UNAUTHORIZED_CLOSE_CODE};
