use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::error::MethodError;
use crate::host::{Host, SiteMapItem};
use crate::method::{Params, RpcMethod};

/// `get_sitemap`: host site map entries, optionally scoped to one domain
/// over both schemes.
pub struct GetSitemap {
    host: Arc<dyn Host>,
}

impl GetSitemap {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl RpcMethod for GetSitemap {
    fn name(&self) -> &'static str {
        "get_sitemap"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let domain = params.str_or_none("domain")?.filter(|domain| !domain.is_empty());
        let include_params = params.bool_or("includeParams", true)?;

        let items = match domain {
            Some(domain) => {
                let mut items = self.host.site_map(Some(&format!("https://{domain}"))).await?;
                items.extend(self.host.site_map(Some(&format!("http://{domain}"))).await?);
                items
            }
            None => self.host.site_map(None).await?,
        };

        let entries: Vec<JsonValue> =
            items.into_iter().map(|item| render_entry(item, include_params)).collect();
        Ok(json!({ "count": entries.len(), "entries": entries }))
    }
}

fn render_entry(item: SiteMapItem, include_params: bool) -> JsonValue {
    let mut entry = JsonMap::new();
    entry.insert("url".into(), item.url.into());
    entry.insert("method".into(), item.method.into());
    entry.insert("statusCode".into(), item.status_code.unwrap_or(0).into());
    entry.insert("mimeType".into(), item.mime_type.unwrap_or_default().into());
    if include_params {
        entry.insert("parameters".into(), item.parameters.into());
    }
    JsonValue::Object(entry)
}
