//! Docver journal: the version store
//!
//! Snapshot creation, the catalog of stored versions, comparison, rollback,
//! integrity checks and explicit retention, tied together by [`Vault`].

pub mod catalog;
pub mod compare;
pub mod host;
pub mod retention;
pub mod rollback;
pub mod snapshot;
pub mod vault;
pub mod verify;

pub use catalog::{Catalog, CatalogScan, CatalogWarning, StoreStats, VersionFilter};
pub use compare::{Comparator, ComparisonReport, Larger};
pub use host::{DocumentHost, FileDocument, StatusSink, TracingStatus};
pub use retention::{GarbageCollector, PruneReport, RetentionPolicy};
pub use rollback::{AtomicReplace, ContentWriter, RollbackCoordinator, RollbackResult};
pub use snapshot::SnapshotStore;
pub use vault::Vault;
pub use verify::VerifyReport;
