use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::RegistryError;
use crate::method::{Params, RpcMethod};
use crate::types::{
    RpcError, RpcRequest, RpcResponse, INTERNAL_ERROR, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

const SERIALIZE_FALLBACK: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;

/// Name to method table, filled once before serving.
#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<&'static str, Arc<dyn RpcMethod>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: Arc<dyn RpcMethod>) -> Result<(), RegistryError> {
        let name = method.name();
        if self.methods.contains_key(name) {
            return Err(RegistryError::DuplicateMethod { name: name.to_string() });
        }
        self.methods.insert(name, method);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher { methods: self.methods }
    }
}

/// Routes raw request text to registered methods and renders the reply.
///
/// `handle` is total: every input, including garbage, produces exactly one
/// response envelope.
pub struct Dispatcher {
    methods: HashMap<&'static str, Arc<dyn RpcMethod>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("methods", &self.method_names()).finish()
    }
}

impl Dispatcher {
    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.methods.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub async fn handle(&self, raw: &str) -> String {
        let response = match parse_request(raw) {
            Ok(request) => self.dispatch(request).await,
            Err(response) => response,
        };
        serde_json::to_string(&response).unwrap_or_else(|err| {
            log::error!("rpc: failed to serialize response: {}", err);
            SERIALIZE_FALLBACK.to_string()
        })
    }

    pub async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        let RpcRequest { id, method, params } = request;
        let Some(handler) = self.methods.get(method.as_str()) else {
            log::debug!("rpc: unknown method {}", method);
            return RpcResponse::error(
                Some(id),
                RpcError::new(METHOD_NOT_FOUND, format!("Method not found: {method}")),
            );
        };

        let outcome =
            AssertUnwindSafe(handler.execute(Params::new(params))).catch_unwind().await;
        match outcome {
            Ok(Ok(result)) => RpcResponse::result(id, result),
            Ok(Err(err)) => {
                log::debug!("rpc: {} failed: {}", method, err);
                RpcResponse::error(Some(id), err.into_rpc_error())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                log::error!("rpc: {} panicked: {}", method, message);
                RpcResponse::error(Some(id), RpcError::new(INTERNAL_ERROR, message))
            }
        }
    }
}

/// Validate the envelope of an inbound message.
pub fn parse_request(raw: &str) -> Result<RpcRequest, RpcResponse> {
    let mut object = match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Object(object)) => object,
        _ => return Err(RpcResponse::error(None, RpcError::new(PARSE_ERROR, "Parse error"))),
    };

    let id = match object.get("id") {
        Some(JsonValue::String(id)) => Some(id.clone()),
        Some(JsonValue::Number(id)) => Some(id.to_string()),
        _ => None,
    };
    let invalid = |id: Option<String>| {
        Err(RpcResponse::error(id, RpcError::new(INVALID_REQUEST, "Invalid request")))
    };

    if object.get("jsonrpc").and_then(JsonValue::as_str) != Some(JSONRPC_VERSION) {
        return invalid(id);
    }
    let Some(id) = id else {
        return invalid(None);
    };
    let method = match object.remove("method") {
        Some(JsonValue::String(method)) => method,
        _ => return invalid(Some(id)),
    };
    let params = match object.remove("params") {
        None | Some(JsonValue::Null) => JsonMap::new(),
        Some(JsonValue::Object(params)) => params,
        Some(_) => return invalid(Some(id)),
    };

    Ok(RpcRequest { id, method, params })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "method panicked".to_string()
    }
}
