//! Epoch resolution: snapshot log entry -> snapshot record -> trunk digest.
//!
//! The scan is linear over the parsed records; the epoch field is the key,
//! not the array position. Log sizes here are one record per cluster
//! reconfiguration, so no epoch index is kept.

use log::debug;

use crate::blobstore::BlobStore;
use crate::digest::Digest;
use crate::error::{FarmError, Result};
use crate::snap::log::SnapLog;
use crate::snap::record::SnapshotRecord;

/// Find the trunk digest captured at target_epoch. A missing log entry or a
/// missing snapshot blob is NotFound; a snapshot blob that exists but fails
/// to read or decode surfaces as Io/Corrupt.
pub fn resolve_trunk_digest(
    log: &SnapLog,
    blobs: &BlobStore,
    target_epoch: u32,
) -> Result<Digest> {
    let entries = log.read_all()?;
    debug!(
        "resolve: scanning {} log entries for epoch {}",
        entries.len(),
        target_epoch
    );

    for entry in &entries {
        if entry.epoch != target_epoch {
            continue;
        }
        let bytes = blobs.get(&entry.digest)?.ok_or_else(|| {
            FarmError::NotFound(format!(
                "snapshot blob {} for epoch {} missing",
                entry.digest, target_epoch
            ))
        })?;
        let record = SnapshotRecord::decode(&bytes)?;
        return Ok(record.trunk_digest);
    }

    Err(FarmError::NotFound(format!(
        "no snapshot for epoch {}",
        target_epoch
    )))
}
