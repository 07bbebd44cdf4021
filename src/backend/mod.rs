//! Generic storage-backend contract and the explicit backend registry.
//!
//! Backends are constructed through create_backend, an explicit name ->
//! constructor map populated here at compile time. Nothing registers itself
//! from module initializers, so the set of available backends is visible in
//! one place.

use std::path::Path;

use crate::config::FarmConfig;
use crate::digest::Digest;
use crate::error::{FarmError, Result};
use crate::snap::record::NodeEntry;

pub mod default;
pub mod farm;

pub use default::DefaultBackend;
pub use farm::{FarmBackend, FarmStat};

/// Storage-backend contract consumed by the cluster's dispatch layer.
///
/// Snapshot and restore calls are serialized by the surrounding cluster
/// layer, relative to each other and to ordinary object I/O; implementations
/// rely on that and take no locks of their own.
pub trait StoreBackend {
    /// Registry name of this backend.
    fn name(&self) -> &'static str;

    /// Prepare on-disk state. Must succeed before any other call; a failure
    /// prevents the node from joining as a storage backend.
    fn init(&mut self) -> Result<()>;

    fn exist(&self, oid: u64) -> Result<bool>;

    /// Write buf at offset, creating the object on first write.
    fn write(&self, oid: u64, buf: &[u8], offset: u64) -> Result<()>;

    /// Exact read of buf.len() bytes at offset.
    fn read(&self, oid: u64, buf: &mut [u8], offset: u64) -> Result<()>;

    /// Make an object visible in the working set.
    fn link(&self, oid: u64) -> Result<()>;

    /// Crash-safe whole-object replace.
    fn atomic_put(&self, oid: u64, data: &[u8]) -> Result<()>;

    /// Recovery-complete notification.
    fn end_recover(&self) -> Result<()>;

    /// Capture the current object set at the next epoch. Returns the
    /// assigned epoch and the snapshot record digest.
    fn snapshot(&self, nodes: &[NodeEntry]) -> Result<(u32, Digest)>;

    /// Remove stale intermediate files.
    fn cleanup(&self) -> Result<()>;

    /// Replace the working object set with the set captured at epoch.
    /// Destructive: anything short of success leaves the working store
    /// indeterminate.
    fn restore(&self, epoch: u32) -> Result<()>;

    /// Raw snapshot log bytes for transfer to another node.
    fn get_snap_file(&self) -> Result<Vec<u8>>;

    /// Reset to an empty working store.
    fn format(&self) -> Result<()>;

    /// Best-effort removal; absence is not an error.
    fn purge_obj(&self, oid: u64) -> Result<()>;

    /// Removal; absence is NotFound.
    fn remove_object(&self, oid: u64) -> Result<()>;

    /// Durability barrier for the working store.
    fn flush(&self) -> Result<()>;
}

/// Construct a backend by registry name. Known names: "farm", "default".
pub fn create_backend(
    name: &str,
    base: &Path,
    cfg: FarmConfig,
) -> Result<Box<dyn StoreBackend>> {
    match name {
        "farm" => Ok(Box::new(FarmBackend::new(base, cfg))),
        "default" => Ok(Box::new(DefaultBackend::new(base, cfg))),
        other => Err(FarmError::Config(format!("unknown backend '{}'", other))),
    }
}
