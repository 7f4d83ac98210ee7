//! Client side of the tapbridge wire protocol.
//!
//! ```ignore
//! let config = ClientConfig::new("ws://127.0.0.1:8198").with_auth_token("s3cret");
//! let client = RpcClient::connect(config).await?;
//! let history = client
//!     .call("get_proxy_history", serde_json::json!({ "domain": "example.com" }))
//!     .await?;
//! client.close().await?;
//! ```

pub mod client;
pub mod error;

pub use client::{ClientConfig, RpcClient, DEFAULT_CALL_TIMEOUT};
pub use error::ClientError;
