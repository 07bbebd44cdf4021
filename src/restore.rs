//! Restore engine: replace the working object set with the set captured at
//! a target epoch.
//!
//! State machine: WIPE -> RESOLVE -> FETCH_TRUNK -> REPLAY -> DONE. The
//! wipe is deliberately destructive-first (it runs before restorability is
//! confirmed), matching the documented recovery contract: anything short of
//! DONE leaves the working store in an indeterminate state that needs
//! operator intervention. Individual unlink failures during WIPE are logged
//! and skipped; from RESOLVE on, the first failure is fatal for the whole
//! restore -- no skip-and-continue, since a partial restore would leave an
//! inconsistent object set silently.

use std::fs;

use log::{debug, error, warn};

use crate::backend::DefaultBackend;
use crate::blobstore::BlobStore;
use crate::error::{FarmError, Result};
use crate::snap::log::SnapLog;
use crate::snap::resolve::resolve_trunk_digest;
use crate::trunk::Trunk;

pub fn restore_from_epoch(
    working: &DefaultBackend,
    blobs: &BlobStore,
    log: &SnapLog,
    target_epoch: u32,
) -> Result<()> {
    debug!("restore: target epoch {}", target_epoch);

    wipe_working_dir(working)?;

    let trunk_digest = resolve_trunk_digest(log, blobs, target_epoch)?;

    let trunk_bytes = blobs.get(&trunk_digest)?.ok_or_else(|| {
        FarmError::NotFound(format!(
            "trunk blob {} for epoch {} missing",
            trunk_digest, target_epoch
        ))
    })?;
    let trunk = Trunk::decode(&trunk_bytes)?;

    for e in &trunk.entries {
        let bytes = blobs.get(&e.digest)?.ok_or_else(|| {
            error!("object {:016x} not restored", e.oid);
            FarmError::NotFound(format!(
                "blob {} for object {:016x} missing",
                e.digest, e.oid
            ))
        })?;
        working.atomic_put_object(e.oid, &bytes)?;
        debug!("object {:016x} restored", e.oid);
    }

    debug!(
        "restore: epoch {} done, {} objects",
        target_epoch,
        trunk.entries.len()
    );
    Ok(())
}

/// Delete every non-dot file directly under the working directory.
/// Per-file failures are logged and skipped (stale leftovers do not affect
/// replay correctness); an unreadable working directory is fatal.
fn wipe_working_dir(working: &DefaultBackend) -> Result<()> {
    let dir = working.working_dir();
    debug!("restore: wiping working dir {}", dir.display());

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let p = entry.path();
        if let Err(e) = fs::remove_file(&p) {
            warn!("wipe: {}: {}", p.display(), e);
            continue;
        }
        debug!("wipe: removed {}", p.display());
    }
    Ok(())
}
