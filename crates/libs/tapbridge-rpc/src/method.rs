use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::MethodError;

/// One callable entry of the command surface.
#[async_trait]
pub trait RpcMethod: Send + Sync {
    /// Wire name, unique within a dispatcher.
    fn name(&self) -> &'static str;

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError>;
}

/// Named parameters of a request.
///
/// Accessors fail with INVALID_PARAMS. A `null` member counts as absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(JsonMap<String, JsonValue>);

impl Params {
    pub fn new(inner: JsonMap<String, JsonValue>) -> Self {
        Self(inner)
    }

    pub fn as_map(&self) -> &JsonMap<String, JsonValue> {
        &self.0
    }

    fn get(&self, name: &str) -> Option<&JsonValue> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// A present, non-empty string.
    pub fn required_str(&self, name: &str) -> Result<&str, MethodError> {
        match self.str_or_none(name)? {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(MethodError::invalid_params(format!("{name} parameter required"))),
        }
    }

    pub fn str_or_none(&self, name: &str) -> Result<Option<&str>, MethodError> {
        match self.get(name) {
            None => Ok(None),
            Some(JsonValue::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(MethodError::invalid_params(format!("{name} must be a string"))),
        }
    }

    pub fn u64_or(&self, name: &str, default: u64) -> Result<u64, MethodError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.as_u64().ok_or_else(|| {
                MethodError::invalid_params(format!("{name} must be a non-negative integer"))
            }),
        }
    }

    pub fn u16_or(&self, name: &str, default: u16) -> Result<u16, MethodError> {
        Ok(self.u16_or_none(name)?.unwrap_or(default))
    }

    pub fn u16_or_none(&self, name: &str) -> Result<Option<u16>, MethodError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|value| u16::try_from(value).ok())
                .map(Some)
                .ok_or_else(|| {
                    MethodError::invalid_params(format!(
                        "{name} must be an integer between 0 and 65535"
                    ))
                }),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, MethodError> {
        match self.get(name) {
            None => Ok(default),
            Some(JsonValue::Bool(value)) => Ok(*value),
            Some(_) => Err(MethodError::invalid_params(format!("{name} must be a boolean"))),
        }
    }

    pub fn object_or_empty(&self, name: &str) -> Result<JsonMap<String, JsonValue>, MethodError> {
        match self.get(name) {
            None => Ok(JsonMap::new()),
            Some(JsonValue::Object(value)) => Ok(value.clone()),
            Some(_) => Err(MethodError::invalid_params(format!("{name} must be an object"))),
        }
    }
}

impl From<JsonMap<String, JsonValue>> for Params {
    fn from(inner: JsonMap<String, JsonValue>) -> Self {
        Self(inner)
    }
}
