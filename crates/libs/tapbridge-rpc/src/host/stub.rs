use std::sync::Arc;

use async_trait::async_trait;

use super::*;
use crate::error::HostError;

/// A host where every capability is unsupported.
///
/// Lets the daemon run standalone: traffic queries answer from the capture
/// store, everything else reports CAPABILITY_UNAVAILABLE.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubHost;

#[async_trait]
impl HostSiteMap for StubHost {
    async fn site_map(&self, _prefix: Option<&str>) -> Result<Vec<SiteMapItem>, HostError> {
        Err(HostError::unsupported("site map"))
    }

    async fn add_to_site_map(&self, _exchange: SentExchange, _note: &str) -> Result<(), HostError> {
        Err(HostError::unsupported("site map"))
    }

    async fn issues(&self) -> Result<Vec<AuditIssue>, HostError> {
        Err(HostError::unsupported("scanner issues"))
    }
}

#[async_trait]
impl HostScope for StubHost {
    async fn is_in_scope(&self, _url: &str) -> Result<bool, HostError> {
        Err(HostError::unsupported("target scope"))
    }

    async fn include_in_scope(&self, _url: &str) -> Result<(), HostError> {
        Err(HostError::unsupported("target scope"))
    }

    async fn exclude_from_scope(&self, _url: &str) -> Result<(), HostError> {
        Err(HostError::unsupported("target scope"))
    }
}

#[async_trait]
impl HostScanner for StubHost {
    async fn start_crawl(&self, _url: &str) -> Result<Arc<dyn ScanTask>, HostError> {
        Err(HostError::unsupported("active scanning"))
    }

    async fn start_audit(&self, _url: &str) -> Result<Arc<dyn ScanTask>, HostError> {
        Err(HostError::unsupported("active scanning"))
    }
}

#[async_trait]
impl HostHttp for StubHost {
    async fn send(&self, _request: OutgoingRequest) -> Result<SentExchange, HostError> {
        Err(HostError::unsupported("request sending"))
    }
}

#[async_trait]
impl HostTools for StubHost {
    async fn send_to_repeater(
        &self,
        _request: RawRequest,
        _tab_name: Option<&str>,
    ) -> Result<(), HostError> {
        Err(HostError::unsupported("repeater"))
    }

    async fn send_to_intruder(
        &self,
        _request: RawRequest,
        _tab_name: Option<&str>,
    ) -> Result<(), HostError> {
        Err(HostError::unsupported("intruder"))
    }
}

#[async_trait]
impl HostInfo for StubHost {
    async fn edition(&self) -> Result<HostEdition, HostError> {
        Err(HostError::unsupported("edition query"))
    }
}
