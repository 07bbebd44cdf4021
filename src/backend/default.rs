//! Default backend: the ordinary (non-snapshot) object I/O path.
//!
//! Working store layout: <base>/obj, one file per live object named by its
//! 16-hex-digit oid. In-place writes preallocate the configured object size
//! on first creation for filesystem locality; whole-object replaces publish
//! by tmp+rename so a crash never exposes a half-written object.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::FarmConfig;
use crate::consts::WORKING_DIR;
use crate::error::{FarmError, Result};
use crate::prealloc::preallocate;
use crate::snap::record::NodeEntry;
use crate::digest::Digest;
use crate::util::fsync_dir;

use super::StoreBackend;

pub struct DefaultBackend {
    working_dir: PathBuf,
    cfg: FarmConfig,
}

impl DefaultBackend {
    pub fn new(base: &Path, cfg: FarmConfig) -> Self {
        Self {
            working_dir: base.join(WORKING_DIR),
            cfg,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn object_path(&self, oid: u64) -> PathBuf {
        self.working_dir.join(format!("{:016x}", oid))
    }

    fn tmp_path(&self, oid: u64) -> PathBuf {
        // Dot-prefixed: invisible to the wipe pass and to list_objects.
        self.working_dir.join(format!(".{:016x}.tmp", oid))
    }

    /// Create the working directory if absent.
    pub fn init_dirs(&self) -> Result<()> {
        match fs::create_dir(&self.working_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Oids of every live object in the working store. Foreign file names
    /// are skipped with a warning.
    pub fn list_objects(&self) -> Result<Vec<u64>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.working_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            match u64::from_str_radix(&name, 16) {
                Ok(oid) if name.len() == 16 => out.push(oid),
                _ => warn!("working dir: skipping foreign file '{}'", name),
            }
        }
        Ok(out)
    }

    /// Whole-object read.
    pub fn read_object(&self, oid: u64) -> Result<Vec<u8>> {
        let path = self.object_path(oid);
        if !path.exists() {
            return Err(FarmError::NotFound(format!("object {:016x}", oid)));
        }
        let mut f = OpenOptions::new().read(true).open(&path)?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Crash-safe whole-object replace: write to a dot-tmp in the working
    /// dir, fsync, rename over the final name.
    pub fn atomic_put_object(&self, oid: u64, data: &[u8]) -> Result<()> {
        let path = self.object_path(oid);
        let tmp = self.tmp_path(oid);
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)?;
            f.write_all(data)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        let _ = fsync_dir(&path);
        Ok(())
    }

    /// Count of live objects (diagnostics).
    pub fn object_count(&self) -> Result<u64> {
        Ok(self.list_objects()?.len() as u64)
    }
}

impl StoreBackend for DefaultBackend {
    fn name(&self) -> &'static str {
        "default"
    }

    fn init(&mut self) -> Result<()> {
        self.init_dirs()
    }

    fn exist(&self, oid: u64) -> Result<bool> {
        Ok(self.object_path(oid).exists())
    }

    fn write(&self, oid: u64, buf: &[u8], offset: u64) -> Result<()> {
        let path = self.object_path(oid);
        let mut created = false;
        let mut f = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(f) => {
                created = true;
                f
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                OpenOptions::new().read(true).write(true).open(&path)?
            }
            Err(e) => return Err(e.into()),
        };

        if created {
            preallocate(&f, self.cfg.object_size)?;
            debug!(
                "object {:016x}: created, preallocated {} bytes",
                oid, self.cfg.object_size
            );
        }

        f.seek(SeekFrom::Start(offset))?;
        f.write_all(buf)?;
        if self.cfg.data_fsync {
            f.sync_all()?;
        }
        Ok(())
    }

    fn read(&self, oid: u64, buf: &mut [u8], offset: u64) -> Result<()> {
        let path = self.object_path(oid);
        if !path.exists() {
            return Err(FarmError::NotFound(format!("object {:016x}", oid)));
        }
        let mut f = OpenOptions::new().read(true).open(&path)?;
        f.seek(SeekFrom::Start(offset))?;
        f.read_exact(buf)?;
        Ok(())
    }

    fn link(&self, oid: u64) -> Result<()> {
        // The working store has a single generation; linking an object that
        // is already visible is a no-op.
        if self.object_path(oid).exists() {
            Ok(())
        } else {
            Err(FarmError::NotFound(format!("object {:016x}", oid)))
        }
    }

    fn atomic_put(&self, oid: u64, data: &[u8]) -> Result<()> {
        self.atomic_put_object(oid, data)
    }

    fn end_recover(&self) -> Result<()> {
        Ok(())
    }

    fn snapshot(&self, _nodes: &[NodeEntry]) -> Result<(u32, Digest)> {
        Err(FarmError::Config(
            "backend 'default' does not support snapshots".into(),
        ))
    }

    /// Remove stale dot-tmp files left behind by interrupted puts.
    fn cleanup(&self) -> Result<()> {
        for entry in fs::read_dir(&self.working_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') && name.ends_with(".tmp") {
                let p = entry.path();
                if let Err(e) = fs::remove_file(&p) {
                    warn!("cleanup: {}: {}", p.display(), e);
                } else {
                    debug!("cleanup: removed stale {}", p.display());
                }
            }
        }
        Ok(())
    }

    fn restore(&self, _epoch: u32) -> Result<()> {
        Err(FarmError::Config(
            "backend 'default' does not support restore".into(),
        ))
    }

    fn get_snap_file(&self) -> Result<Vec<u8>> {
        Err(FarmError::Config(
            "backend 'default' has no snapshot log".into(),
        ))
    }

    fn format(&self) -> Result<()> {
        match fs::remove_dir_all(&self.working_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&self.working_dir)?;
        self.flush()
    }

    fn purge_obj(&self, oid: u64) -> Result<()> {
        match fs::remove_file(self.object_path(oid)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_object(&self, oid: u64) -> Result<()> {
        match fs::remove_file(self.object_path(oid)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FarmError::NotFound(format!("object {:016x}", oid)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&self) -> Result<()> {
        #[cfg(unix)]
        {
            let d = fs::File::open(&self.working_dir)?;
            d.sync_all()?;
        }
        Ok(())
    }
}
