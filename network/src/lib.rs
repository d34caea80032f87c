//! Bootstrap synchronization over TCP: the frontier exchange and the
//! bulk-pull block streams.

pub mod error;
pub mod sync;

pub use error::SyncError;
pub use sync::{BulkPullSyncer, FrontierSyncer, SYNC_CACHE_SIZE, SYNC_TIMEOUT};
