use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::error::MethodError;
use crate::host::{Host, HttpService, RawRequest};
use crate::method::{Params, RpcMethod};

const DEFAULT_PORT: u16 = 443;

/// Rewrite any mix of LF, CRLF and stray CR into CRLF line endings.
pub fn normalize_line_endings(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "").replace('\n', "\r\n")
}

struct Forward<'a> {
    request: RawRequest,
    tab_name: Option<&'a str>,
}

fn read_forward(params: &Params) -> Result<Forward<'_>, MethodError> {
    let content = params.required_str("request")?;
    let host = params.required_str("host")?;
    let port = params.u16_or("port", DEFAULT_PORT)?;
    let secure = params.bool_or("https", true)?;
    let tab_name = params.str_or_none("tabName")?;
    Ok(Forward {
        request: RawRequest {
            service: HttpService { host: host.to_string(), port, secure },
            content: normalize_line_endings(content),
        },
        tab_name,
    })
}

fn sent_message(tool: &str, tab_name: Option<&str>) -> String {
    match tab_name {
        Some(tab) => format!("Request sent to {tool} (tab: {tab})"),
        None => format!("Request sent to {tool}"),
    }
}

/// `send_to_repeater`: open a raw request in a repeater tab.
pub struct SendToRepeater {
    host: Arc<dyn Host>,
}

impl SendToRepeater {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl RpcMethod for SendToRepeater {
    fn name(&self) -> &'static str {
        "send_to_repeater"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let Forward { request, tab_name } = read_forward(&params)?;
        self.host.send_to_repeater(request, tab_name).await?;
        Ok(json!({ "success": true, "message": sent_message("Repeater", tab_name) }))
    }
}

/// `send_to_intruder`: load a raw request into the intruder.
pub struct SendToIntruder {
    host: Arc<dyn Host>,
}

impl SendToIntruder {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl RpcMethod for SendToIntruder {
    fn name(&self) -> &'static str {
        "send_to_intruder"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let Forward { request, tab_name } = read_forward(&params)?;
        let HttpService { host, port, secure } = request.service.clone();
        self.host.send_to_intruder(request, tab_name).await?;
        Ok(json!({
            "success": true,
            "message": sent_message("Intruder", tab_name),
            "host": host,
            "port": port,
            "https": secure,
        }))
    }
}
