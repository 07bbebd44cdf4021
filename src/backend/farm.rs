//! Farm backend: the epoch-snapshot driver.
//!
//! Routes init/snapshot/restore/get_snap_file into the farm machinery
//! (layout, capability probe, blob store, snapshot log, restore engine) and
//! forwards every ordinary object operation to the default backend
//! unchanged.

use std::path::{Path, PathBuf};

use log::{error, info};
use serde::Serialize;

use crate::blobstore::BlobStore;
use crate::config::FarmConfig;
use crate::digest::Digest;
use crate::error::{FarmError, Result};
use crate::layout::{ensure_layout, FarmPaths};
use crate::probe::supports_xattr;
use crate::restore::restore_from_epoch;
use crate::snap::log::{SnapLog, SnapshotLogEntry};
use crate::snap::record::NodeEntry;
use crate::snap::writer::write_snapshot;

use super::{DefaultBackend, StoreBackend};

pub struct FarmBackend {
    base: PathBuf,
    default: DefaultBackend,
    state: Option<FarmState>,
}

struct FarmState {
    paths: FarmPaths,
    blobs: BlobStore,
    log: SnapLog,
}

/// Store counters for diagnostics ("stat" CLI output).
#[derive(Debug, Serialize)]
pub struct FarmStat {
    pub objects: u64,
    pub blobs: u64,
    pub snapshots: u64,
    pub latest_epoch: u32,
}

impl FarmBackend {
    pub fn new(base: &Path, cfg: FarmConfig) -> Self {
        Self {
            base: base.to_path_buf(),
            default: DefaultBackend::new(base, cfg),
            state: None,
        }
    }

    fn state(&self) -> Result<&FarmState> {
        self.state
            .as_ref()
            .ok_or_else(|| FarmError::Config("farm backend not initialized".into()))
    }

    /// Resolved farm paths (present after init).
    pub fn paths(&self) -> Option<&FarmPaths> {
        self.state.as_ref().map(|s| &s.paths)
    }

    /// Parsed snapshot log entries (diagnostics).
    pub fn snap_log_entries(&self) -> Result<Vec<SnapshotLogEntry>> {
        self.state()?.log.read_all()
    }

    /// Whole-object read from the working store.
    pub fn read_object(&self, oid: u64) -> Result<Vec<u8>> {
        self.default.read_object(oid)
    }

    /// Store counters for the stat output.
    pub fn stat(&self) -> Result<FarmStat> {
        let st = self.state()?;
        let entries = st.log.read_all()?;
        Ok(FarmStat {
            objects: self.default.object_count()?,
            blobs: st.blobs.blob_count()?,
            snapshots: entries.len() as u64,
            latest_epoch: entries.last().map(|e| e.epoch).unwrap_or(0),
        })
    }
}

impl StoreBackend for FarmBackend {
    fn name(&self) -> &'static str {
        "farm"
    }

    /// Init order: layout -> capability probe -> blob store -> snapshot log
    /// -> default backend. The first failure aborts; a node with a failed
    /// init never joins as a storage backend.
    fn init(&mut self) -> Result<()> {
        info!("using farm store backend at {}", self.base.display());

        let paths = ensure_layout(&self.base)?;

        if !supports_xattr(&self.base) {
            error!(
                "extended attributes are not supported on {}",
                self.base.display()
            );
            return Err(FarmError::Config(format!(
                "no xattr support on {}",
                self.base.display()
            )));
        }

        let blobs = BlobStore::open(&paths.objects_dir)?;
        let log = SnapLog::open(&paths.farm_dir)?;
        self.default.init_dirs()?;

        self.state = Some(FarmState { paths, blobs, log });
        Ok(())
    }

    fn exist(&self, oid: u64) -> Result<bool> {
        self.default.exist(oid)
    }

    fn write(&self, oid: u64, buf: &[u8], offset: u64) -> Result<()> {
        self.default.write(oid, buf, offset)
    }

    fn read(&self, oid: u64, buf: &mut [u8], offset: u64) -> Result<()> {
        self.default.read(oid, buf, offset)
    }

    fn link(&self, oid: u64) -> Result<()> {
        self.default.link(oid)
    }

    fn atomic_put(&self, oid: u64, data: &[u8]) -> Result<()> {
        self.default.atomic_put(oid, data)
    }

    fn end_recover(&self) -> Result<()> {
        self.default.end_recover()
    }

    fn snapshot(&self, nodes: &[NodeEntry]) -> Result<(u32, Digest)> {
        let st = self.state()?;
        write_snapshot(&self.default, &st.blobs, &st.log, nodes)
    }

    fn cleanup(&self) -> Result<()> {
        self.default.cleanup()
    }

    fn restore(&self, epoch: u32) -> Result<()> {
        let st = self.state()?;
        restore_from_epoch(&self.default, &st.blobs, &st.log, epoch)
    }

    fn get_snap_file(&self) -> Result<Vec<u8>> {
        self.state()?.log.export()
    }

    fn format(&self) -> Result<()> {
        self.default.format()
    }

    fn purge_obj(&self, oid: u64) -> Result<()> {
        self.default.purge_obj(oid)
    }

    fn remove_object(&self, oid: u64) -> Result<()> {
        self.default.remove_object(oid)
    }

    fn flush(&self) -> Result<()> {
        self.default.flush()
    }
}
