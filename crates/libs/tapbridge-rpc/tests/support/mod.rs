#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use tapbridge_capture::TrafficStore;
use tapbridge_rpc::host::*;
use tapbridge_rpc::{register_default_methods, Dispatcher, HostError, MethodRegistry, ScanRegistry};

#[derive(Debug)]
pub struct FakeTask {
    pub kind: &'static str,
    pub url: String,
    pub deleted: AtomicBool,
    pub already_finished: bool,
}

#[async_trait]
impl ScanTask for FakeTask {
    async fn status(&self) -> Result<ScanTaskStatus, HostError> {
        Ok(ScanTaskStatus {
            status_message: format!("{} running", self.kind),
            request_count: 12,
            error_count: 0,
            issue_count: (self.kind == "audit").then_some(1),
        })
    }

    async fn delete(&self) -> Result<(), HostError> {
        if self.already_finished {
            return Err(HostError::NotFound { resource: format!("{} task", self.kind) });
        }
        self.deleted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory host used by the catalog tests.
#[derive(Debug)]
pub struct FakeHost {
    pub edition: HostEdition,
    pub scope: Mutex<Vec<String>>,
    pub site_map: Vec<SiteMapItem>,
    pub added_to_site_map: Mutex<Vec<(SentExchange, String)>>,
    pub issues: Vec<AuditIssue>,
    pub response: Option<HostResponse>,
    pub sent: Mutex<Vec<OutgoingRequest>>,
    pub forwarded: Mutex<Vec<(&'static str, RawRequest, Option<String>)>>,
    pub tasks: Mutex<Vec<Arc<FakeTask>>>,
    pub finished_tasks: bool,
    pub refuse_audit: bool,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            edition: HostEdition::Professional,
            scope: Mutex::new(Vec::new()),
            site_map: Vec::new(),
            added_to_site_map: Mutex::new(Vec::new()),
            issues: Vec::new(),
            response: Some(HostResponse {
                status_code: 200,
                headers: vec![
                    ("Content-Type".into(), "text/plain".into()),
                    ("Set-Cookie".into(), "a=1".into()),
                    ("Set-Cookie".into(), "b=2".into()),
                ],
                body: "pong".into(),
            }),
            sent: Mutex::new(Vec::new()),
            forwarded: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            finished_tasks: false,
            refuse_audit: false,
        }
    }
}

impl FakeHost {
    fn start_task(&self, kind: &'static str, url: &str) -> Arc<dyn ScanTask> {
        let task = Arc::new(FakeTask {
            kind,
            url: url.to_string(),
            deleted: AtomicBool::new(false),
            already_finished: self.finished_tasks,
        });
        self.tasks.lock().push(Arc::clone(&task));
        task
    }
}

#[async_trait]
impl HostSiteMap for FakeHost {
    async fn site_map(&self, prefix: Option<&str>) -> Result<Vec<SiteMapItem>, HostError> {
        Ok(self
            .site_map
            .iter()
            .filter(|item| prefix.map_or(true, |prefix| item.url.starts_with(prefix)))
            .cloned()
            .collect())
    }

    async fn add_to_site_map(&self, exchange: SentExchange, note: &str) -> Result<(), HostError> {
        self.added_to_site_map.lock().push((exchange, note.to_string()));
        Ok(())
    }

    async fn issues(&self) -> Result<Vec<AuditIssue>, HostError> {
        Ok(self.issues.clone())
    }
}

#[async_trait]
impl HostScope for FakeHost {
    async fn is_in_scope(&self, url: &str) -> Result<bool, HostError> {
        Ok(self.scope.lock().iter().any(|prefix| url.starts_with(prefix.as_str())))
    }

    async fn include_in_scope(&self, url: &str) -> Result<(), HostError> {
        self.scope.lock().push(url.to_string());
        Ok(())
    }

    async fn exclude_from_scope(&self, url: &str) -> Result<(), HostError> {
        self.scope.lock().retain(|prefix| !url.starts_with(prefix.as_str()));
        Ok(())
    }
}

#[async_trait]
impl HostScanner for FakeHost {
    async fn start_crawl(&self, url: &str) -> Result<Arc<dyn ScanTask>, HostError> {
        Ok(self.start_task("crawl", url))
    }

    async fn start_audit(&self, url: &str) -> Result<Arc<dyn ScanTask>, HostError> {
        if self.refuse_audit {
            return Err(HostError::failed("audit refused"));
        }
        Ok(self.start_task("audit", url))
    }
}

#[async_trait]
impl HostHttp for FakeHost {
    async fn send(&self, request: OutgoingRequest) -> Result<SentExchange, HostError> {
        self.sent.lock().push(request.clone());
        Ok(SentExchange { request, response: self.response.clone() })
    }
}

#[async_trait]
impl HostTools for FakeHost {
    async fn send_to_repeater(
        &self,
        request: RawRequest,
        tab_name: Option<&str>,
    ) -> Result<(), HostError> {
        self.forwarded.lock().push(("repeater", request, tab_name.map(str::to_string)));
        Ok(())
    }

    async fn send_to_intruder(
        &self,
        request: RawRequest,
        tab_name: Option<&str>,
    ) -> Result<(), HostError> {
        self.forwarded.lock().push(("intruder", request, tab_name.map(str::to_string)));
        Ok(())
    }
}

#[async_trait]
impl HostInfo for FakeHost {
    async fn edition(&self) -> Result<HostEdition, HostError> {
        Ok(self.edition)
    }
}

pub struct Harness {
    pub dispatcher: Dispatcher,
    pub store: Arc<TrafficStore>,
    pub scans: Arc<ScanRegistry>,
}

impl Harness {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::with_store(host, Arc::new(TrafficStore::new(100)))
    }

    pub fn with_store(host: Arc<dyn Host>, store: Arc<TrafficStore>) -> Self {
        let scans = Arc::new(ScanRegistry::new());
        let mut registry = MethodRegistry::new();
        register_default_methods(&mut registry, Arc::clone(&store), host, Arc::clone(&scans))
            .expect("catalog registers cleanly");
        Self { dispatcher: registry.build(), store, scans }
    }

    pub async fn call(&self, method: &str, params: JsonValue) -> JsonValue {
        let raw = serde_json::json!({
            "jsonrpc": "2.0",
            "id": "t-1",
            "method": method,
            "params": params,
        })
        .to_string();
        let text = self.dispatcher.handle(&raw).await;
        let response: JsonValue = serde_json::from_str(&text).expect("response is JSON");
        assert_eq!(response["id"], "t-1");
        response
    }

    pub async fn result(&self, method: &str, params: JsonValue) -> JsonValue {
        let response = self.call(method, params).await;
        assert!(response.get("error").is_none(), "unexpected error: {response}");
        response["result"].clone()
    }

    pub async fn error(&self, method: &str, params: JsonValue) -> (i64, String) {
        let response = self.call(method, params).await;
        let error = &response["error"];
        (
            error["code"].as_i64().expect("error code"),
            error["message"].as_str().expect("error message").to_string(),
        )
    }
}
