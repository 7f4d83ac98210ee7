use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::record::{partition_key, CapturedExchange, RecordBuilder};

/// Records kept per host when nothing else is configured.
pub const DEFAULT_MAX_PER_DOMAIN: usize = 100;

type Partition = Arc<Mutex<VecDeque<Arc<CapturedExchange>>>>;

/// Filter and page size for [`TrafficStore::query`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: usize,
    pub method: Option<String>,
    pub status_code: Option<u16>,
}

impl HistoryQuery {
    pub fn new(limit: usize) -> Self {
        Self { limit, method: None, status_code: None }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    fn matches(&self, record: &CapturedExchange) -> bool {
        let method_ok = self
            .method
            .as_deref()
            .map_or(true, |method| record.method().eq_ignore_ascii_case(method));
        let status_ok = self.status_code.map_or(true, |status| record.status_code() == status);
        method_ok && status_ok
    }
}

/// Result of a filtered read: the newest `limit` matches plus how many
/// records matched before the limit was applied.
#[derive(Clone, Debug, Default)]
pub struct HistoryPage {
    pub records: Vec<Arc<CapturedExchange>>,
    pub matched: usize,
}

impl HistoryPage {
    pub fn returned(&self) -> usize {
        self.records.len()
    }
}

/// Capture buffer partitioned by lower-cased host.
///
/// Each partition is a newest-first deque capped at `max_per_domain`; the
/// oldest record is evicted in the same critical section as the insert, so
/// no reader ever observes an over-full partition. Partitions are created
/// lazily and only removed by [`TrafficStore::clear`] /
/// [`TrafficStore::clear_all`].
#[derive(Debug)]
pub struct TrafficStore {
    partitions: DashMap<String, Partition>,
    next_id: AtomicU64,
    max_per_domain: usize,
}

impl Default for TrafficStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_DOMAIN)
    }
}

impl TrafficStore {
    pub fn new(max_per_domain: usize) -> Self {
        let max_per_domain = if max_per_domain == 0 {
            log::warn!("capture: max_per_domain=0 clamped to 1");
            1
        } else {
            max_per_domain
        };
        Self { partitions: DashMap::new(), next_id: AtomicU64::new(0), max_per_domain }
    }

    pub fn max_per_domain(&self) -> usize {
        self.max_per_domain
    }

    /// Finalize `builder` with the next sequence id and insert it at the head
    /// of its host partition. Returns the assigned id.
    ///
    /// The id is drawn while the partition lock is held, so within one host
    /// the deque order always matches id order.
    pub fn store(&self, builder: RecordBuilder) -> u64 {
        let key = builder.partition_key();
        let partition = self.partition_or_create(key);
        let mut records = partition.lock();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        records.push_front(Arc::new(builder.build(id)));
        while records.len() > self.max_per_domain {
            records.pop_back();
        }
        id
    }

    /// Newest-first records for `domain` that pass the query filters.
    pub fn query(&self, domain: &str, query: &HistoryQuery) -> HistoryPage {
        let Some(partition) = self.partition(domain) else {
            return HistoryPage::default();
        };
        let records = partition.lock();
        let mut page = HistoryPage::default();
        for record in records.iter().filter(|record| query.matches(record)) {
            page.matched += 1;
            if page.records.len() < query.limit {
                page.records.push(Arc::clone(record));
            }
        }
        page
    }

    /// Current number of records held for `domain`.
    pub fn count(&self, domain: &str) -> usize {
        self.partition(domain).map_or(0, |partition| partition.lock().len())
    }

    pub fn clear(&self, domain: &str) {
        self.partitions.remove(&partition_key(domain));
    }

    pub fn clear_all(&self) {
        self.partitions.clear();
    }

    /// Known partitions and their sizes, sorted by key.
    pub fn domains(&self) -> Vec<(String, usize)> {
        let mut domains = self
            .partitions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().lock().len()))
            .collect::<Vec<_>>();
        domains.sort();
        domains
    }

    fn partition(&self, domain: &str) -> Option<Partition> {
        self.partitions.get(&partition_key(domain)).map(|entry| Arc::clone(entry.value()))
    }

    fn partition_or_create(&self, key: String) -> Partition {
        if let Some(existing) = self.partitions.get(&key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.partitions.entry(key).or_default().value())
    }
}
