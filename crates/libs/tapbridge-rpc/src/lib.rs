//! JSON-RPC 2.0 command surface of the bridge.
//!
//! A [`Dispatcher`] turns one raw text message into one response envelope.
//! Methods implement [`RpcMethod`] and reach the inspection tool through
//! the capability traits in [`host`]; [`StubHost`] implements them all as
//! unsupported so the bridge can run without a real host attached.
//!
//! ```ignore
//! let mut registry = MethodRegistry::new();
//! register_default_methods(&mut registry, store, Arc::new(StubHost), scans)?;
//! let dispatcher = registry.build();
//! let reply = dispatcher.handle(r#"{"jsonrpc":"2.0","id":"1","method":"get_scope"}"#).await;
//! ```

pub mod dispatch;
pub mod error;
pub mod host;
pub mod method;
pub mod methods;
pub mod tasks;
pub mod types;

pub use dispatch::{parse_request, Dispatcher, MethodRegistry};
pub use error::{HostError, MethodError, RegistryError};
pub use host::{Host, StubHost};
pub use method::{Params, RpcMethod};
pub use methods::register_default_methods;
pub use tasks::{ScanEntry, ScanRegistry};
pub use types::*;
