//! Content-addressed blob store (the farm objects area).
//!
//! Blobs live at <objects_dir>/<hh>/<hex38>, keyed by the SHA-1 of their
//! content. Writes publish by rename: payload goes to a tmp file in the
//! shard directory, then rename makes it visible under its final name.
//! A digest already present is never rewritten (write-once), so concurrent
//! writers of identical content are idempotent by construction. Reads
//! recompute the digest and reject mismatching bytes.

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::digest::Digest;
use crate::error::{FarmError, Result};
use crate::util::fsync_dir;

pub struct BlobStore {
    objects_dir: PathBuf,
}

impl BlobStore {
    /// Open the blob store rooted at the farm objects directory. The shard
    /// tree must already exist (ensure_layout).
    pub fn open(objects_dir: &Path) -> Result<Self> {
        if !objects_dir.is_dir() {
            return Err(FarmError::Config(format!(
                "blob store missing at {}",
                objects_dir.display()
            )));
        }
        Ok(Self {
            objects_dir: objects_dir.to_path_buf(),
        })
    }

    /// objects/<hh>/<rest>
    fn blob_path(&self, digest: &Digest) -> PathBuf {
        let hex = digest.to_hex();
        self.objects_dir.join(&hex[0..2]).join(&hex[2..])
    }

    /// Store bytes and return their digest. No-op if the digest is already
    /// present.
    pub fn put(&self, bytes: &[u8]) -> Result<Digest> {
        let digest = Digest::of(bytes);
        let path = self.blob_path(&digest);
        if path.exists() {
            return Ok(digest);
        }

        let tmp = path.with_extension("tmp");
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)?;
            f.write_all(bytes)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        let _ = fsync_dir(&path);
        Ok(digest)
    }

    /// Read a blob back. Returns None when absent; bytes that no longer
    /// match their digest are corruption, not absence.
    pub fn get(&self, digest: &Digest) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(digest);
        if !path.exists() {
            return Ok(None);
        }
        let mut f = OpenOptions::new().read(true).open(&path)?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;

        let actual = Digest::of(&buf);
        if actual != *digest {
            return Err(FarmError::Corrupt(format!(
                "blob {} digest mismatch (computed {})",
                digest, actual
            )));
        }
        Ok(Some(buf))
    }

    pub fn has(&self, digest: &Digest) -> bool {
        self.blob_path(digest).exists()
    }

    /// Size of a stored blob, if present.
    pub fn size(&self, digest: &Digest) -> Result<Option<u64>> {
        let path = self.blob_path(digest);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(path.metadata()?.len()))
    }

    /// Number of blobs currently stored (diagnostics).
    pub fn blob_count(&self) -> Result<u64> {
        let mut n = 0;
        for shard in fs::read_dir(&self.objects_dir)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                if entry.path().extension().is_none() {
                    n += 1;
                }
            }
        }
        Ok(n)
    }
}
