use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tapbridge_capture::coalesce_headers;

use crate::error::MethodError;
use crate::host::{Host, OutgoingRequest};
use crate::method::{Params, RpcMethod};

const DEFAULT_SOURCE: &str = "tapbridge";

/// `send_request`: issue a request through the host's HTTP stack.
pub struct SendRequest {
    host: Arc<dyn Host>,
}

impl SendRequest {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl RpcMethod for SendRequest {
    fn name(&self) -> &'static str {
        "send_request"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let url = params.required_str("url")?;
        let method = params.str_or_none("method")?.unwrap_or("GET");
        let body = params.str_or_none("body")?.unwrap_or_default();
        let add_to_site_map = params.bool_or("addToSiteMap", false)?;
        let source = params.str_or_none("source")?.unwrap_or(DEFAULT_SOURCE);

        let mut headers = Vec::new();
        for (name, value) in params.object_or_empty("headers")? {
            let JsonValue::String(value) = value else {
                return Err(MethodError::invalid_params(format!(
                    "header {name} must be a string"
                )));
            };
            headers.push((name, value));
        }

        let request = OutgoingRequest {
            url: url.to_string(),
            method: method.to_string(),
            headers,
            body: body.to_string(),
        };
        let started = Instant::now();
        let exchange = self.host.send(request).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let Some(response) = exchange.response.clone() else {
            return Err(MethodError::internal("Request failed: no response received"));
        };
        if add_to_site_map {
            self.host.add_to_site_map(exchange, &format!("Source: {source}")).await?;
        }

        Ok(json!({
            "statusCode": response.status_code,
            "headers": coalesce_headers(response.headers),
            "body": response.body,
            "time": elapsed_ms,
            "addedToSiteMap": add_to_site_map,
        }))
    }
}
