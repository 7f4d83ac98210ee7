use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::error::MethodError;
use crate::host::Host;
use crate::method::{Params, RpcMethod};

/// `get_scope`: whether a URL is in the host's target scope.
pub struct GetScope {
    host: Arc<dyn Host>,
}

impl GetScope {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl RpcMethod for GetScope {
    fn name(&self) -> &'static str {
        "get_scope"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let Some(url) = params.str_or_none("url")? else {
            return Ok(json!({
                "message": "Provide a 'url' parameter to check if it's in scope",
                "usage": "Call with {url: 'https://example.com'} to check scope status",
                "note": "Use modify_scope to add/remove URLs from scope",
            }));
        };
        let in_scope = self.host.is_in_scope(url).await?;
        Ok(json!({ "url": url, "inScope": in_scope }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeAction {
    Add,
    Remove,
}

impl ScopeAction {
    fn parse(action: &str) -> Option<Self> {
        if action.eq_ignore_ascii_case("add") {
            Some(Self::Add)
        } else if action.eq_ignore_ascii_case("remove") {
            Some(Self::Remove)
        } else {
            None
        }
    }
}

/// `modify_scope`: include or exclude a URL, reporting scope before and
/// after.
pub struct ModifyScope {
    host: Arc<dyn Host>,
}

impl ModifyScope {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl RpcMethod for ModifyScope {
    fn name(&self) -> &'static str {
        "modify_scope"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let (Some(action), Some(url)) = (params.str_or_none("action")?, params.str_or_none("url")?)
        else {
            return Err(MethodError::invalid_params("action and url parameters required"));
        };
        let Some(parsed) = ScopeAction::parse(action) else {
            return Err(MethodError::invalid_params("action must be 'add' or 'remove'"));
        };

        let was_in_scope = self.host.is_in_scope(url).await?;
        match parsed {
            ScopeAction::Add => self.host.include_in_scope(url).await?,
            ScopeAction::Remove => self.host.exclude_from_scope(url).await?,
        }
        let is_now_in_scope = self.host.is_in_scope(url).await?;
        log::info!("rpc: scope {} {}", action.to_ascii_lowercase(), url);

        Ok(json!({
            "success": true,
            "action": action,
            "url": url,
            "wasInScope": was_in_scope,
            "isNowInScope": is_now_in_scope,
        }))
    }
}
