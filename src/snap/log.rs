//! Append-only snapshot log.
//!
//! File: <farm_dir>/snap_log. Record (LE): [epoch u32][digest 20] = 24
//! bytes, no file header; the file is a flat array of records. Flushed
//! records are never rewritten. The epoch field is the authoritative key --
//! readers scan by epoch, never by array position.
//!
//! Crash note: a torn trailing record (process died mid-append) is skipped
//! on read and overwritten by the next append, so torn tails cannot poison
//! record alignment.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use log::warn;

use crate::consts::{SNAP_LOG_FILE, SNAP_LOG_REC_SIZE};
use crate::digest::Digest;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLogEntry {
    pub epoch: u32,
    pub digest: Digest,
}

pub struct SnapLog {
    path: PathBuf,
}

impl SnapLog {
    /// Open the log in the farm metadata dir, creating an empty file when
    /// missing.
    pub fn open(farm_dir: &Path) -> Result<Self> {
        let path = farm_dir.join(SNAP_LOG_FILE);
        if !path.exists() {
            let f = OpenOptions::new().create(true).write(true).open(&path)?;
            f.sync_all()?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of complete records currently in the log.
    pub fn len(&self) -> Result<u64> {
        Ok(fs::metadata(&self.path)?.len() / SNAP_LOG_REC_SIZE as u64)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read every complete record into memory.
    pub fn read_all(&self) -> Result<Vec<SnapshotLogEntry>> {
        let buf = self.export()?;
        let complete = buf.len() - buf.len() % SNAP_LOG_REC_SIZE;
        if complete != buf.len() {
            warn!(
                "snap log {}: ignoring torn {}-byte tail",
                self.path.display(),
                buf.len() - complete
            );
        }

        let mut out = Vec::with_capacity(complete / SNAP_LOG_REC_SIZE);
        for rec in buf[..complete].chunks_exact(SNAP_LOG_REC_SIZE) {
            out.push(SnapshotLogEntry {
                epoch: LittleEndian::read_u32(&rec[0..4]),
                digest: Digest::from_bytes(&rec[4..])?,
            });
        }
        Ok(out)
    }

    /// Append one record: a single write at the last complete-record
    /// boundary, then fsync. Concurrent appenders must be serialized by the
    /// caller (epoch assignment reads the log length first).
    pub fn append(&self, epoch: u32, digest: &Digest) -> Result<()> {
        let mut rec = [0u8; SNAP_LOG_REC_SIZE];
        LittleEndian::write_u32(&mut rec[0..4], epoch);
        rec[4..].copy_from_slice(digest.as_bytes());

        let mut f = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let len = f.metadata()?.len();
        let off = len - len % SNAP_LOG_REC_SIZE as u64;
        f.seek(SeekFrom::Start(off))?;
        f.write_all(&rec)?;
        f.sync_all()?;
        Ok(())
    }

    /// The raw log bytes, verbatim (snapshot-file export for transfer to
    /// another node).
    pub fn export(&self) -> Result<Vec<u8>> {
        let mut f = OpenOptions::new().read(true).open(&self.path)?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        Ok(buf)
    }
}
