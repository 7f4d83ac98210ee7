use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use tapbridge_capture::now_millis;

use crate::error::MethodError;
use crate::host::{Host, HostEdition, ScanTask};
use crate::method::{Params, RpcMethod};
use crate::tasks::{ScanEntry, ScanRegistry};

/// `start_scan`: start an audit of a URL, optionally preceded by a crawl.
pub struct StartScan {
    host: Arc<dyn Host>,
    scans: Arc<ScanRegistry>,
}

impl StartScan {
    pub fn new(host: Arc<dyn Host>, scans: Arc<ScanRegistry>) -> Self {
        Self { host, scans }
    }
}

#[async_trait]
impl RpcMethod for StartScan {
    fn name(&self) -> &'static str {
        "start_scan"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        if self.host.edition().await? != HostEdition::Professional {
            return Err(MethodError::capability_unavailable(
                "Active scanning requires the professional edition",
            ));
        }
        let url = params.required_str("url")?;
        let crawl_enabled = params.bool_or("crawl", false)?;

        let crawl = if crawl_enabled {
            Some(self.host.start_crawl(url).await?)
        } else {
            None
        };
        let audit = match self.host.start_audit(url).await {
            Ok(audit) => audit,
            Err(err) => {
                // don't leave an orphaned crawl behind
                if let Some(crawl) = &crawl {
                    if let Err(cleanup) = crawl.delete().await {
                        log::debug!("rpc: crawl for {} not cleaned up: {}", url, cleanup);
                    }
                }
                return Err(err.into());
            }
        };

        let scan_id = self.scans.insert(ScanEntry {
            crawl,
            audit,
            target_url: url.to_string(),
            started_at_ms: now_millis(),
        });
        let kind = if crawl_enabled { "Crawl and audit" } else { "Audit" };
        log::info!("rpc: scan {} started for {} (crawl={})", scan_id, url, crawl_enabled);

        Ok(json!({
            "scanId": scan_id,
            "status": "running",
            "crawlEnabled": crawl_enabled,
            "message": format!("{kind} started for: {url}"),
        }))
    }
}

/// `stop_scan`: cancel both tasks of a scan and forget it.
///
/// Cancellation is best-effort; a task the host already finished shows up as
/// `false` in `crawlStopped`/`auditStopped` while the scan still counts as
/// stopped.
pub struct StopScan {
    scans: Arc<ScanRegistry>,
}

impl StopScan {
    pub fn new(scans: Arc<ScanRegistry>) -> Self {
        Self { scans }
    }
}

#[async_trait]
impl RpcMethod for StopScan {
    fn name(&self) -> &'static str {
        "stop_scan"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let scan_id = params.required_str("scanId")?;
        let Some(entry) = self.scans.remove(scan_id) else {
            return Err(MethodError::invalid_params(format!("No scan found with ID: {scan_id}")));
        };

        let crawl_stopped = match &entry.crawl {
            Some(crawl) => stop_task(scan_id, "crawl", crawl.as_ref()).await,
            None => false,
        };
        let audit_stopped = stop_task(scan_id, "audit", entry.audit.as_ref()).await;
        log::info!("rpc: scan {} stopped for {}", scan_id, entry.target_url);

        Ok(json!({
            "scanId": scan_id,
            "stopped": true,
            "crawlStopped": crawl_stopped,
            "auditStopped": audit_stopped,
            "targetUrl": entry.target_url,
            "message": format!("Scan stopped for: {}", entry.target_url),
        }))
    }
}

async fn stop_task(scan_id: &str, kind: &str, task: &dyn ScanTask) -> bool {
    match task.delete().await {
        Ok(()) => true,
        Err(err) => {
            log::debug!("rpc: scan {} {} already gone: {}", scan_id, kind, err);
            false
        }
    }
}

/// `get_scan_status`: progress of a running scan.
pub struct GetScanStatus {
    scans: Arc<ScanRegistry>,
}

impl GetScanStatus {
    pub fn new(scans: Arc<ScanRegistry>) -> Self {
        Self { scans }
    }
}

#[async_trait]
impl RpcMethod for GetScanStatus {
    fn name(&self) -> &'static str {
        "get_scan_status"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        let scan_id = params.required_str("scanId")?;
        let Some(entry) = self.scans.get(scan_id) else {
            return Err(MethodError::invalid_params(format!("No scan found with ID: {scan_id}")));
        };

        let mut result = json!({
            "scanId": scan_id,
            "targetUrl": entry.target_url,
            "startedAt": entry.started_at_ms,
            "elapsedMs": now_millis().saturating_sub(entry.started_at_ms).max(0),
            "audit": serde_json::to_value(entry.audit.status().await?)?,
        });
        if let Some(crawl) = &entry.crawl {
            result["crawl"] = serde_json::to_value(crawl.status().await?)?;
        }
        Ok(result)
    }
}
