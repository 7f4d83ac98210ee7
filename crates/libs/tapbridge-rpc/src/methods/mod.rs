//! The method catalog exposed to clients.

mod forward;
mod history;
mod issues;
mod scan;
mod scope;
mod send_request;
mod sitemap;

use std::sync::Arc;

use tapbridge_capture::TrafficStore;

use crate::dispatch::MethodRegistry;
use crate::error::RegistryError;
use crate::host::Host;
use crate::tasks::ScanRegistry;

pub use forward::{normalize_line_endings, SendToIntruder, SendToRepeater};
pub use history::{GetProxyHistory, DEFAULT_HISTORY_LIMIT};
pub use issues::{GetScannerIssues, EVIDENCE_CHAR_LIMIT, EVIDENCE_PAIR_LIMIT};
pub use scan::{GetScanStatus, StartScan, StopScan};
pub use scope::{GetScope, ModifyScope};
pub use send_request::SendRequest;
pub use sitemap::GetSitemap;

/// Register every catalog method, wired to the given store, host and scan
/// registry.
pub fn register_default_methods(
    registry: &mut MethodRegistry,
    store: Arc<TrafficStore>,
    host: Arc<dyn Host>,
    scans: Arc<ScanRegistry>,
) -> Result<(), RegistryError> {
    registry.register(Arc::new(GetProxyHistory::new(store)))?;
    registry.register(Arc::new(GetSitemap::new(Arc::clone(&host))))?;
    registry.register(Arc::new(SendRequest::new(Arc::clone(&host))))?;
    registry.register(Arc::new(StartScan::new(Arc::clone(&host), Arc::clone(&scans))))?;
    registry.register(Arc::new(StopScan::new(Arc::clone(&scans))))?;
    registry.register(Arc::new(GetScanStatus::new(scans)))?;
    registry.register(Arc::new(GetScope::new(Arc::clone(&host))))?;
    registry.register(Arc::new(ModifyScope::new(Arc::clone(&host))))?;
    registry.register(Arc::new(GetScannerIssues::new(Arc::clone(&host))))?;
    registry.register(Arc::new(SendToRepeater::new(Arc::clone(&host))))?;
    registry.register(Arc::new(SendToIntruder::new(host)))?;
    Ok(())
}

/// Clamp a client-supplied count to the platform's `usize`.
pub(crate) fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
