//! Bounded capture buffer for HTTP traffic observed by the host tool.
//!
//! The crate has three layers:
//!
//! - [`CapturedExchange`]: one immutable request/response record, built
//!   through a [`RecordBuilder`] whose id is injected by the store
//! - [`TrafficStore`]: records partitioned by lower-cased host, newest
//!   first, capped per partition
//! - [`TrafficRecorder`]: turns raw [`ObservedExchange`]s from the host into
//!   records, truncating bodies and swallowing malformed input
//!
//! The store is safe to share between any number of ingesting threads and
//! querying tasks. Each partition has its own lock, so heavy traffic to one
//! host never serializes capture for another.

pub mod error;
pub mod ingest;
pub mod record;
pub mod store;

pub use error::CaptureError;
pub use ingest::{
    truncate_body, ObservedExchange, ObservedRequest, ObservedResponse, RecorderStats,
    RecorderStatsSnapshot, TrafficRecorder, DEFAULT_MAX_BODY_SIZE,
};
pub use record::{
    coalesce_headers, now_millis, partition_key, CapturedExchange, HeaderMap, RecordBuilder,
};
pub use store::{HistoryPage, HistoryQuery, TrafficStore, DEFAULT_MAX_PER_DOMAIN};
