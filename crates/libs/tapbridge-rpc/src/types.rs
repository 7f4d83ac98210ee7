use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// The host edition or configuration does not offer the capability.
pub const CAPABILITY_UNAVAILABLE: i64 = -32001;
pub const NOT_IN_SCOPE: i64 = -32002;
pub const TIMEOUT: i64 = -32003;

/// A validated inbound request. Numeric ids are already coerced to strings
/// and absent params are an empty object.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    pub params: JsonMap<String, JsonValue>,
}

impl RpcRequest {
    pub fn new(id: impl Into<String>, method: impl Into<String>) -> Self {
        Self { id: id.into(), method: method.into(), params: JsonMap::new() }
    }

    pub fn with_params(mut self, params: JsonMap<String, JsonValue>) -> Self {
        self.params = params;
        self
    }

    /// Wire form, as sent by a client.
    pub fn to_value(&self) -> JsonValue {
        serde_json::json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": self.id,
            "method": self.method,
            "params": self.params,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }
}

/// Exactly one of `result` or `error`, flattened into the envelope.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    Result(JsonValue),
    Error(RpcError),
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<String>,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    pub fn result(id: impl Into<String>, result: JsonValue) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id: Some(id.into()), outcome: RpcOutcome::Result(result) }
    }

    pub fn error(id: Option<String>, error: RpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, outcome: RpcOutcome::Error(error) }
    }

    /// Read a response envelope received from a server.
    ///
    /// Returns `None` unless the value carries exactly one of `result` or
    /// `error` and the error (if any) is well formed.
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        let id = match object.get("id") {
            Some(JsonValue::String(id)) => Some(id.clone()),
            Some(JsonValue::Number(id)) => Some(id.to_string()),
            Some(JsonValue::Null) | None => None,
            Some(_) => return None,
        };
        let outcome = match (object.get("result"), object.get("error")) {
            (Some(result), None) => RpcOutcome::Result(result.clone()),
            (None, Some(error)) => {
                RpcOutcome::Error(serde_json::from_value(error.clone()).ok()?)
            }
            _ => return None,
        };
        Some(Self { jsonrpc: JSONRPC_VERSION, id, outcome })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, RpcOutcome::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_envelope_has_no_error_member() {
        let response = RpcResponse::result("7", json!({"ok": true}));
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": "7", "result": {"ok": true}}));
    }

    #[test]
    fn error_envelope_serializes_null_id_and_omits_absent_data() {
        let response = RpcResponse::error(None, RpcError::new(PARSE_ERROR, "Parse error"));
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32700, "message": "Parse error"},
            })
        );
    }

    #[test]
    fn from_value_rejects_ambiguous_envelopes() {
        assert!(RpcResponse::from_value(&json!({"id": "1"})).is_none());
        let both = json!({"id": "1", "result": 1, "error": {"code": 1, "message": "x"}});
        assert!(RpcResponse::from_value(&both).is_none());

        let parsed = RpcResponse::from_value(&json!({
            "jsonrpc": "2.0", "id": "3", "error": {"code": -32601, "message": "Method not found: x"}
        }))
        .expect("valid error envelope");
        assert!(parsed.is_error());
        assert_eq!(parsed.id.as_deref(), Some("3"));
    }
}
