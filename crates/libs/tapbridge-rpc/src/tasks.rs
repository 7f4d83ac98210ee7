use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand_core::{OsRng, RngCore};

use crate::host::ScanTask;

/// Handles of one scan started through `start_scan`.
#[derive(Clone)]
pub struct ScanEntry {
    pub crawl: Option<Arc<dyn ScanTask>>,
    pub audit: Arc<dyn ScanTask>,
    pub target_url: String,
    pub started_at_ms: i64,
}

impl std::fmt::Debug for ScanEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEntry")
            .field("has_crawl", &self.crawl.is_some())
            .field("target_url", &self.target_url)
            .field("started_at_ms", &self.started_at_ms)
            .finish()
    }
}

/// Scans started by clients, keyed by an opaque random id.
///
/// Owned by whoever builds the dispatcher and shared with the scan methods.
#[derive(Debug, Default)]
pub struct ScanRegistry {
    entries: Mutex<HashMap<String, ScanEntry>>,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` under a fresh id and return the id.
    pub fn insert(&self, entry: ScanEntry) -> String {
        let mut entries = self.entries.lock();
        let mut id = new_scan_id();
        while entries.contains_key(&id) {
            id = new_scan_id();
        }
        entries.insert(id.clone(), entry);
        id
    }

    pub fn get(&self, id: &str) -> Option<ScanEntry> {
        self.entries.lock().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<ScanEntry> {
        self.entries.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn new_scan_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
