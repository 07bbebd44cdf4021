//! On-disk layout for the farm metadata area.
//!
//! <base>/.farm            farm metadata root (snapshot log)
//! <base>/.farm/objects    content-addressed blobs, 256 shard dirs 00..ff
//!
//! Creation is idempotent: an already-existing directory is not an error, so
//! initialization attempts racing at process start are safe. Any other
//! creation failure aborts init.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::consts::{FARM_DIR, OBJECTS_DIR, SHARD_COUNT};
use crate::error::Result;

/// Resolved farm paths. Built once by ensure_layout and passed into every
/// component that needs them; there is no process-wide mutable state.
#[derive(Debug, Clone)]
pub struct FarmPaths {
    /// <base>/.farm
    pub farm_dir: PathBuf,
    /// <base>/.farm/objects
    pub objects_dir: PathBuf,
}

impl FarmPaths {
    pub fn new(base: &Path) -> Self {
        let farm_dir = base.join(FARM_DIR);
        let objects_dir = farm_dir.join(OBJECTS_DIR);
        Self {
            farm_dir,
            objects_dir,
        }
    }
}

fn mkdir_idempotent(p: &Path) -> io::Result<()> {
    match fs::create_dir(p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Create (if absent) the farm metadata tree under base and return the
/// resolved paths. Safe to call more than once.
pub fn ensure_layout(base: &Path) -> Result<FarmPaths> {
    let paths = FarmPaths::new(base);
    mkdir_idempotent(&paths.farm_dir)?;
    mkdir_idempotent(&paths.objects_dir)?;
    for i in 0..SHARD_COUNT {
        mkdir_idempotent(&paths.objects_dir.join(format!("{:02x}", i)))?;
    }
    Ok(paths)
}
