//! Capabilities of the inspection tool the bridge is attached to.
//!
//! Methods reach the host only through these traits. A real integration
//! implements all of them on one type and hands it over as `Arc<dyn Host>`.

mod stub;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HostError;

pub use stub::StubHost;
pub use types::*;

/// Site map contents and the scanner's issue list.
#[async_trait]
pub trait HostSiteMap: Send + Sync {
    /// Site map entries whose URL starts with `prefix`, or all entries.
    async fn site_map(&self, prefix: Option<&str>) -> Result<Vec<SiteMapItem>, HostError>;

    /// Add a sent exchange to the site map with a note attached.
    async fn add_to_site_map(&self, exchange: SentExchange, note: &str) -> Result<(), HostError>;

    async fn issues(&self) -> Result<Vec<AuditIssue>, HostError>;
}

#[async_trait]
pub trait HostScope: Send + Sync {
    async fn is_in_scope(&self, url: &str) -> Result<bool, HostError>;

    async fn include_in_scope(&self, url: &str) -> Result<(), HostError>;

    async fn exclude_from_scope(&self, url: &str) -> Result<(), HostError>;
}

/// A running crawl or audit.
#[async_trait]
pub trait ScanTask: Send + Sync {
    async fn status(&self) -> Result<ScanTaskStatus, HostError>;

    /// Cancel the task. Fails when the host already discarded it.
    async fn delete(&self) -> Result<(), HostError>;
}

/// Active scanning. Hosts without a scanner return `Unsupported`.
#[async_trait]
pub trait HostScanner: Send + Sync {
    async fn start_crawl(&self, url: &str) -> Result<Arc<dyn ScanTask>, HostError>;

    async fn start_audit(&self, url: &str) -> Result<Arc<dyn ScanTask>, HostError>;
}

#[async_trait]
pub trait HostHttp: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<SentExchange, HostError>;
}

/// Hand-off of raw requests to the host's manual testing tools.
#[async_trait]
pub trait HostTools: Send + Sync {
    async fn send_to_repeater(
        &self,
        request: RawRequest,
        tab_name: Option<&str>,
    ) -> Result<(), HostError>;

    async fn send_to_intruder(
        &self,
        request: RawRequest,
        tab_name: Option<&str>,
    ) -> Result<(), HostError>;
}

#[async_trait]
pub trait HostInfo: Send + Sync {
    async fn edition(&self) -> Result<HostEdition, HostError>;
}

/// Composite trait encompassing every host capability.
///
/// Automatically implemented for any type that implements all sub-traits.
pub trait Host: HostSiteMap + HostScope + HostScanner + HostHttp + HostTools + HostInfo {}

impl<T> Host for T where
    T: HostSiteMap + HostScope + HostScanner + HostHttp + HostTools + HostInfo
{
}
