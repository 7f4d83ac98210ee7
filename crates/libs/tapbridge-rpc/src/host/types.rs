use serde::{Deserialize, Serialize};

/// Target service of a raw request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpService {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

/// A raw HTTP/1.1 request addressed to a service. `content` uses CRLF line
/// endings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRequest {
    pub service: HttpService,
    pub content: String,
}

/// A request built from a URL and sent through the host's HTTP stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Outcome of [`super::HostHttp::send`]. A `None` response means the host
/// gave up without one (connection refused, TLS failure, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SentExchange {
    pub request: OutgoingRequest,
    pub response: Option<HostResponse>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteMapItem {
    pub url: String,
    pub method: String,
    pub status_code: Option<u16>,
    pub mime_type: Option<String>,
    pub parameters: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEdition {
    Community,
    Professional,
    Enterprise,
}

/// Progress of a crawl or audit task.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanTaskStatus {
    pub status_message: String,
    pub request_count: u64,
    pub error_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_count: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssueDefinition {
    pub name: String,
    pub background: Option<String>,
    pub remediation: Option<String>,
    pub type_index: u64,
}

/// One request/response pair attached to an issue, rendered as raw text.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueEvidence {
    pub request: Option<String>,
    pub response: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollaboratorInteraction {
    pub id: String,
    pub timestamp: String,
}

/// A finding reported by the host's scanner.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditIssue {
    pub name: String,
    pub severity: String,
    pub confidence: String,
    pub base_url: String,
    pub detail: Option<String>,
    pub remediation: Option<String>,
    pub http_service: Option<HttpService>,
    pub definition: Option<IssueDefinition>,
    pub request_responses: Vec<IssueEvidence>,
    pub collaborator_interactions: Vec<CollaboratorInteraction>,
}
