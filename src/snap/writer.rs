//! Snapshot writer: capture the working object set at the next epoch.
//!
//! Write order is the integrity invariant: object blobs land first (during
//! the trunk build), then the trunk blob, then the snapshot record blob, and
//! only then the log record. A log entry therefore always resolves to a
//! complete, consistent trunk; any earlier failure aborts before the append.

use log::{debug, info};

use crate::backend::DefaultBackend;
use crate::blobstore::BlobStore;
use crate::error::Result;
use crate::snap::log::SnapLog;
use crate::snap::record::{NodeEntry, SnapshotRecord};
use crate::digest::Digest;
use crate::trunk::build_trunk;

/// Snapshot the working object set. The epoch is derived from the log at
/// call time (length + 1), never chosen by the caller; concurrent snapshot
/// calls must be serialized externally or epochs would duplicate or skip.
/// Returns the assigned epoch and the snapshot record digest.
pub fn write_snapshot(
    working: &DefaultBackend,
    blobs: &BlobStore,
    log: &SnapLog,
    nodes: &[NodeEntry],
) -> Result<(u32, Digest)> {
    let epoch = log.len()? as u32 + 1;
    debug!("snapshot: assigning epoch {}", epoch);

    let trunk = build_trunk(working, blobs)?;
    let trunk_digest = blobs.put(&trunk.encode())?;

    let record = SnapshotRecord {
        epoch,
        nodes: nodes.to_vec(),
        trunk_digest,
    };
    let snap_digest = blobs.put(&record.encode())?;

    log.append(epoch, &snap_digest)?;

    info!(
        "snapshot: epoch {} captured, {} objects, trunk {}",
        epoch,
        trunk.entries.len(),
        trunk_digest
    );
    Ok((epoch, snap_digest))
}
