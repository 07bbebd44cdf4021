// Base modules
pub mod config;
pub mod consts;
pub mod error;
pub mod util;

// Digests and the content-addressed blob area
pub mod blobstore;
pub mod digest;

// Farm layout and platform pieces
pub mod layout;
pub mod prealloc;
pub mod probe;

// Snapshot machinery
pub mod restore;
pub mod snap; // src/snap/{mod,log,record,writer,resolve}.rs
pub mod trunk;

// Backend drivers and the registry
pub mod backend; // src/backend/{mod,default,farm}.rs

// CLI (used by the farmstore binary)
pub mod cli;

// Convenience re-exports
pub use backend::{create_backend, DefaultBackend, FarmBackend, FarmStat, StoreBackend};
pub use blobstore::BlobStore;
pub use config::FarmConfig;
pub use digest::Digest;
pub use error::{FarmError, Result};
pub use layout::{ensure_layout, FarmPaths};
pub use restore::restore_from_epoch;
pub use snap::{
    resolve_trunk_digest, write_snapshot, NodeEntry, SnapLog, SnapshotLogEntry, SnapshotRecord,
};
pub use trunk::{build_trunk, Trunk, TrunkEntry};
