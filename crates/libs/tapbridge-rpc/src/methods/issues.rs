use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use super::to_usize;
use crate::error::MethodError;
use crate::host::{AuditIssue, Host, HostEdition, IssueEvidence};
use crate::method::{Params, RpcMethod};

/// Request/response pairs kept per issue.
pub const EVIDENCE_PAIR_LIMIT: usize = 3;
/// Characters kept of each rendered request or response.
pub const EVIDENCE_CHAR_LIMIT: usize = 5000;

const DEFAULT_LIMIT: u64 = 100;

/// `get_scanner_issues`: paged, filtered view of the scanner's findings.
pub struct GetScannerIssues {
    host: Arc<dyn Host>,
}

impl GetScannerIssues {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl RpcMethod for GetScannerIssues {
    fn name(&self) -> &'static str {
        "get_scanner_issues"
    }

    async fn execute(&self, params: Params) -> Result<JsonValue, MethodError> {
        if self.host.edition().await? != HostEdition::Professional {
            return Err(MethodError::capability_unavailable(
                "Scanner issues require the professional edition",
            ));
        }

        let limit = to_usize(params.u64_or("limit", DEFAULT_LIMIT)?);
        let offset = params.u64_or("offset", 0)?;
        let url_filter = params.str_or_none("url")?;
        let severity_filter = params.str_or_none("severity")?;

        let all = self.host.issues().await?;
        let issues: Vec<AuditIssue> = all
            .iter()
            .filter(|issue| url_filter.map_or(true, |url| issue.base_url.contains(url)))
            .filter(|issue| {
                severity_filter
                    .map_or(true, |severity| issue.severity.eq_ignore_ascii_case(severity))
            })
            .skip(to_usize(offset))
            .take(limit)
            .cloned()
            .map(cap_evidence)
            .collect();

        Ok(json!({
            "returned": issues.len(),
            "issues": serde_json::to_value(issues)?,
            "total": all.len(),
            "offset": offset,
        }))
    }
}

fn cap_evidence(mut issue: AuditIssue) -> AuditIssue {
    issue.request_responses.truncate(EVIDENCE_PAIR_LIMIT);
    for IssueEvidence { request, response } in &mut issue.request_responses {
        for text in [request, response].into_iter().flatten() {
            truncate_chars(text, EVIDENCE_CHAR_LIMIT);
        }
    }
    issue
}

fn truncate_chars(text: &mut String, limit: usize) {
    if let Some((cut, _)) = text.char_indices().nth(limit) {
        text.truncate(cut);
        text.push_str("... (truncated)");
    }
}
