use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tapbridge_capture::{CapturedExchange, HistoryQuery, TrafficStore};

use super::to_usize;
use crate::error::MethodError;
use crate::method::{Params, RpcMethod};

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;

/// `get_proxy_history`: newest captured exchanges for one host.
///
/// `total` is everything retained for the host, `matched` what passed the
/// filters, `returned` what fit in the limit.
pub struct GetProxyHistory {
    store: Arc<TrafficStore>,
}

impl GetProxyHistory {
    pub fn new(store: Arc<TrafficStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RpcMethod for GetProxyHistory {
    fn name(&self) -> &'static str {
        "get_proxy_history"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let domain = params.required_str("domain")?;
        let mut query = HistoryQuery::new(to_usize(params.u64_or("limit", DEFAULT_HISTORY_LIMIT)?));
        if let Some(method) = params.str_or_none("method")? {
            query = query.with_method(method);
        }
        if let Some(status_code) = params.u16_or_none("statusCode")? {
            query = query.with_status_code(status_code);
        }

        let page = self.store.query(domain, &query);
        let requests: Vec<&CapturedExchange> = page.records.iter().map(Arc::as_ref).collect();
        Ok(json!({
            "requests": serde_json::to_value(requests)?,
            "total": self.store.count(domain),
            "matched": page.matched,
            "returned": page.returned(),
        }))
    }
}
