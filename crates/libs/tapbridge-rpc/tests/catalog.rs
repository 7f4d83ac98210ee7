mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::json;
use tapbridge_capture::{RecordBuilder, TrafficStore};
use tapbridge_rpc::host::{AuditIssue, HostEdition, IssueEvidence, SiteMapItem};
use tapbridge_rpc::{
    StubHost, CAPABILITY_UNAVAILABLE, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND,
};

use support::{FakeHost, Harness};

fn issue(name: &str, severity: &str, base_url: &str) -> AuditIssue {
    AuditIssue {
        name: name.into(),
        severity: severity.into(),
        confidence: "FIRM".into(),
        base_url: base_url.into(),
        detail: Some("details".into()),
        remediation: None,
        http_service: None,
        definition: None,
        request_responses: vec![IssueEvidence {
            request: Some("GET / HTTP/1.1".into()),
            response: None,
        }],
        collaborator_interactions: Vec::new(),
    }
}

#[tokio::test]
async fn catalog_registers_every_method() {
    let harness = Harness::new(Arc::new(StubHost));
    assert_eq!(
        harness.dispatcher.method_names(),
        vec![
            "get_proxy_history",
            "get_scan_status",
            "get_scanner_issues",
            "get_scope",
            "get_sitemap",
            "modify_scope",
            "send_request",
            "send_to_intruder",
            "send_to_repeater",
            "start_scan",
            "stop_scan",
        ]
    );
}

#[tokio::test]
async fn eviction_keeps_only_the_newest_records() {
    let store = Arc::new(TrafficStore::new(2));
    let harness = Harness::with_store(Arc::new(StubHost), Arc::clone(&store));
    for path in ["a", "b", "c"] {
        store.store(
            RecordBuilder::new()
                .host("x.test")
                .method("GET")
                .url(format!("https://x.test/{path}"))
                .status_code(200),
        );
    }

    let result =
        harness.result("get_proxy_history", json!({"domain": "x.test", "limit": 10})).await;
    assert_eq!(result["total"], 2);
    assert_eq!(result["returned"], 2);
    assert_eq!(result["requests"][0]["url"], "https://x.test/c");
    assert_eq!(result["requests"][1]["url"], "https://x.test/b");
}

#[tokio::test]
async fn stub_host_reports_capability_unavailable() {
    let harness = Harness::new(Arc::new(StubHost));
    for (method, params) in [
        ("start_scan", json!({"url": "https://a.test"})),
        ("get_scope", json!({"url": "https://a.test"})),
        ("get_sitemap", json!({})),
        ("send_request", json!({"url": "https://a.test"})),
        ("get_scanner_issues", json!({})),
        ("send_to_repeater", json!({"request": "GET / HTTP/1.1", "host": "a.test"})),
    ] {
        let (code, _) = harness.error(method, params).await;
        assert_eq!(code, CAPABILITY_UNAVAILABLE, "method {method}");
    }
    // traffic queries still work without a host
    harness.result("get_proxy_history", json!({"domain": "a.test"})).await;
}

#[tokio::test]
async fn unknown_method_is_reported_by_name() {
    let harness = Harness::new(Arc::new(StubHost));
    let (code, message) = harness.error("trigger_scan", json!({})).await;
    assert_eq!(code, METHOD_NOT_FOUND);
    assert_eq!(message, "Method not found: trigger_scan");
}

#[tokio::test]
async fn send_request_returns_response_and_annotates_site_map() {
    let host = Arc::new(FakeHost::default());
    let harness = Harness::new(host.clone());

    let result = harness
        .result(
            "send_request",
            json!({
                "url": "https://a.test/ping",
                "method": "POST",
                "headers": {"X-Token": "abc"},
                "body": "hello",
                "addToSiteMap": true,
            }),
        )
        .await;
    assert_eq!(result["statusCode"], 200);
    assert_eq!(result["body"], "pong");
    assert_eq!(result["headers"]["Set-Cookie"], "a=1, b=2");
    assert_eq!(result["addedToSiteMap"], true);
    assert!(result["time"].is_u64());

    let sent = host.sent.lock();
    assert_eq!(sent[0].method, "POST");
    assert_eq!(sent[0].headers, vec![("X-Token".to_string(), "abc".to_string())]);
    assert_eq!(sent[0].body, "hello");
    let added = host.added_to_site_map.lock();
    assert_eq!(added[0].1, "Source: tapbridge");
}

#[tokio::test]
async fn send_request_without_response_is_an_internal_error() {
    let host = FakeHost { response: None, ..FakeHost::default() };
    let harness = Harness::new(Arc::new(host));
    let (code, message) = harness.error("send_request", json!({"url": "https://down.test"})).await;
    assert_eq!(code, INTERNAL_ERROR);
    assert_eq!(message, "Request failed: no response received");
}

#[tokio::test]
async fn scan_lifecycle_start_status_stop() {
    let host = Arc::new(FakeHost::default());
    let harness = Harness::new(host.clone());

    let started =
        harness.result("start_scan", json!({"url": "https://a.test", "crawl": true})).await;
    assert_eq!(started["status"], "running");
    assert_eq!(started["crawlEnabled"], true);
    assert_eq!(started["message"], "Crawl and audit started for: https://a.test");
    let scan_id = started["scanId"].as_str().expect("scan id").to_string();
    assert_eq!(harness.scans.len(), 1);

    let status = harness.result("get_scan_status", json!({"scanId": scan_id})).await;
    assert_eq!(status["targetUrl"], "https://a.test");
    assert_eq!(status["audit"]["issueCount"], 1);
    assert_eq!(status["crawl"]["statusMessage"], "crawl running");

    let stopped = harness.result("stop_scan", json!({"scanId": scan_id})).await;
    assert_eq!(stopped["stopped"], true);
    assert_eq!(stopped["crawlStopped"], true);
    assert_eq!(stopped["auditStopped"], true);
    assert_eq!(stopped["targetUrl"], "https://a.test");
    assert!(harness.scans.is_empty());
    assert!(host.tasks.lock().iter().all(|task| task.deleted.load(Ordering::SeqCst)));

    let (code, message) = harness.error("stop_scan", json!({"scanId": scan_id})).await;
    assert_eq!(code, INVALID_PARAMS);
    assert_eq!(message, format!("No scan found with ID: {scan_id}"));
}

#[tokio::test]
async fn stopping_finished_tasks_still_counts_as_stopped() {
    let host = FakeHost { finished_tasks: true, ..FakeHost::default() };
    let harness = Harness::new(Arc::new(host));

    let started = harness.result("start_scan", json!({"url": "https://a.test"})).await;
    assert_eq!(started["crawlEnabled"], false);
    let stopped = harness.result("stop_scan", json!({"scanId": started["scanId"]})).await;
    assert_eq!(stopped["stopped"], true);
    assert_eq!(stopped["crawlStopped"], false);
    assert_eq!(stopped["auditStopped"], false);
}

#[tokio::test]
async fn scope_can_be_queried_and_modified() {
    let harness = Harness::new(Arc::new(FakeHost::default()));

    let usage = harness.result("get_scope", json!({})).await;
    assert!(usage["usage"].is_string());

    let added = harness
        .result("modify_scope", json!({"action": "ADD", "url": "https://a.test/"}))
        .await;
    assert_eq!(added["wasInScope"], false);
    assert_eq!(added["isNowInScope"], true);

    let checked = harness.result("get_scope", json!({"url": "https://a.test/login"})).await;
    assert_eq!(checked["inScope"], true);

    let removed = harness
        .result("modify_scope", json!({"action": "remove", "url": "https://a.test/"}))
        .await;
    assert_eq!(removed["wasInScope"], true);
    assert_eq!(removed["isNowInScope"], false);

    let (code, message) =
        harness.error("modify_scope", json!({"action": "toggle", "url": "https://a.test/"})).await;
    assert_eq!(code, INVALID_PARAMS);
    assert_eq!(message, "action must be 'add' or 'remove'");
    let (code, _) = harness.error("modify_scope", json!({"action": "add"})).await;
    assert_eq!(code, INVALID_PARAMS);
}

#[tokio::test]
async fn sitemap_scopes_a_domain_over_both_schemes() {
    let item = |url: &str| SiteMapItem {
        url: url.into(),
        method: "GET".into(),
        status_code: Some(200),
        mime_type: Some("HTML".into()),
        parameters: vec!["q".into()],
    };
    let host = FakeHost {
        site_map: vec![item("https://a.test/"), item("http://a.test/old"), item("https://b.test/")],
        ..FakeHost::default()
    };
    let harness = Harness::new(Arc::new(host));

    let scoped = harness.result("get_sitemap", json!({"domain": "a.test"})).await;
    assert_eq!(scoped["count"], 2);
    assert_eq!(scoped["entries"][0]["parameters"], json!(["q"]));

    let all = harness.result("get_sitemap", json!({"includeParams": false})).await;
    assert_eq!(all["count"], 3);
    assert!(all["entries"][0].get("parameters").is_none());
}

#[tokio::test]
async fn scanner_issues_are_filtered_and_paged() {
    let host = FakeHost {
        issues: vec![
            issue("XSS", "MEDIUM", "https://a.test/search"),
            issue("SQLi", "HIGH", "https://a.test/item"),
            issue("SQLi", "HIGH", "https://b.test/item"),
            issue("Info", "INFORMATION", "https://a.test/"),
        ],
        ..FakeHost::default()
    };
    let harness = Harness::new(Arc::new(host));

    let high = harness.result("get_scanner_issues", json!({"severity": "high"})).await;
    assert_eq!(high["total"], 4);
    assert_eq!(high["returned"], 2);

    let paged = harness
        .result("get_scanner_issues", json!({"url": "a.test", "offset": 1, "limit": 1}))
        .await;
    assert_eq!(paged["returned"], 1);
    assert_eq!(paged["offset"], 1);
    assert_eq!(paged["issues"][0]["name"], "SQLi");
    assert_eq!(paged["issues"][0]["baseUrl"], "https://a.test/item");
}

#[tokio::test]
async fn scanner_issues_need_the_professional_edition() {
    let host = FakeHost { edition: HostEdition::Community, ..FakeHost::default() };
    let harness = Harness::new(Arc::new(host));
    let (code, _) = harness.error("get_scanner_issues", json!({})).await;
    assert_eq!(code, CAPABILITY_UNAVAILABLE);
}

#[tokio::test]
async fn scan_availability_is_checked_before_params() {
    let host = FakeHost { edition: HostEdition::Community, ..FakeHost::default() };
    let harness = Harness::new(Arc::new(host));
    let (code, message) = harness.error("start_scan", json!({})).await;
    assert_eq!(code, CAPABILITY_UNAVAILABLE);
    assert_eq!(message, "Active scanning requires the professional edition");

    let harness = Harness::new(Arc::new(FakeHost::default()));
    let (code, message) = harness.error("start_scan", json!({})).await;
    assert_eq!(code, INVALID_PARAMS);
    assert_eq!(message, "url parameter required");
    assert!(harness.scans.is_empty());
}

#[tokio::test]
async fn refused_audit_deletes_the_started_crawl() {
    let host = Arc::new(FakeHost { refuse_audit: true, ..FakeHost::default() });
    let harness = Harness::new(host.clone());
    let (code, message) = harness
        .error("start_scan", json!({"url": "https://a.test", "crawl": true}))
        .await;
    assert_eq!(code, INTERNAL_ERROR);
    assert!(message.contains("audit refused"), "{message}");

    let tasks = host.tasks.lock();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].kind, "crawl");
    assert!(tasks[0].deleted.load(Ordering::SeqCst));
    assert!(harness.scans.is_empty());
}

#[tokio::test]
async fn failed_crawl_cleanup_keeps_the_audit_error() {
    let host = FakeHost { refuse_audit: true, finished_tasks: true, ..FakeHost::default() };
    let harness = Harness::new(Arc::new(host));
    let (code, message) = harness
        .error("start_scan", json!({"url": "https://a.test", "crawl": true}))
        .await;
    assert_eq!(code, INTERNAL_ERROR);
    assert!(message.contains("audit refused"), "{message}");
}

#[tokio::test]
async fn raw_requests_are_forwarded_with_crlf() {
    let host = Arc::new(FakeHost::default());
    let harness = Harness::new(host.clone());

    let repeater = harness
        .result(
            "send_to_repeater",
            json!({
                "request": "GET / HTTP/1.1\nHost: a.test\n\n",
                "host": "a.test",
                "tabName": "login",
            }),
        )
        .await;
    assert_eq!(repeater["message"], "Request sent to Repeater (tab: login)");

    let intruder = harness
        .result(
            "send_to_intruder",
            json!({
                "request": "GET / HTTP/1.1\r\n\r\n",
                "host": "a.test",
                "port": 8080,
                "https": false,
            }),
        )
        .await;
    assert_eq!(intruder["host"], "a.test");
    assert_eq!(intruder["port"], 8080);
    assert_eq!(intruder["https"], false);

    let forwarded = host.forwarded.lock();
    assert_eq!(forwarded[0].0, "repeater");
    assert_eq!(forwarded[0].1.content, "GET / HTTP/1.1\r\nHost: a.test\r\n\r\n");
    assert_eq!(forwarded[0].1.service.port, 443);
    assert!(forwarded[0].1.service.secure);
    assert_eq!(forwarded[1].0, "intruder");
    assert_eq!(forwarded[1].2, None);

    let (code, message) =
        harness.error("send_to_intruder", json!({"request": "GET /", "host": ""})).await;
    assert_eq!(code, INVALID_PARAMS);
    assert_eq!(message, "host parameter required");
}
