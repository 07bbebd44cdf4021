//! Trunk: the complete object-id -> digest table for one snapshot.
//!
//! Blob layout (LE):
//! [magic8 "FARMTRNK"][version u32 = 1][count u64]
//! count * [oid u64][digest 20][size u64]
//! [crc32 u32]  -- over header + entries
//!
//! Entries are sorted by oid ascending, so the same object set always
//! encodes to the same bytes and therefore the same trunk digest.

use byteorder::{ByteOrder, LittleEndian};
use crc32fast::Hasher as Crc32;
use log::debug;

use crate::backend::DefaultBackend;
use crate::blobstore::BlobStore;
use crate::consts::{TRUNK_ENTRY_SIZE, TRUNK_HDR_SIZE, TRUNK_MAGIC, TRUNK_VERSION};
use crate::digest::Digest;
use crate::error::{FarmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrunkEntry {
    pub oid: u64,
    pub digest: Digest,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trunk {
    pub entries: Vec<TrunkEntry>,
}

impl Trunk {
    pub fn encode(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(TRUNK_HDR_SIZE + self.entries.len() * TRUNK_ENTRY_SIZE + 4);
        let mut b4 = [0u8; 4];
        let mut b8 = [0u8; 8];

        out.extend_from_slice(TRUNK_MAGIC);
        LittleEndian::write_u32(&mut b4, TRUNK_VERSION);
        out.extend_from_slice(&b4);
        LittleEndian::write_u64(&mut b8, self.entries.len() as u64);
        out.extend_from_slice(&b8);

        for e in &self.entries {
            LittleEndian::write_u64(&mut b8, e.oid);
            out.extend_from_slice(&b8);
            out.extend_from_slice(e.digest.as_bytes());
            LittleEndian::write_u64(&mut b8, e.size);
            out.extend_from_slice(&b8);
        }

        let mut hasher = Crc32::new();
        hasher.update(&out);
        LittleEndian::write_u32(&mut b4, hasher.finalize());
        out.extend_from_slice(&b4);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < TRUNK_HDR_SIZE + 4 {
            return Err(FarmError::Corrupt(format!(
                "trunk blob too short ({} bytes)",
                bytes.len()
            )));
        }
        if &bytes[0..8] != TRUNK_MAGIC {
            return Err(FarmError::Corrupt("bad trunk magic".into()));
        }
        let version = LittleEndian::read_u32(&bytes[8..12]);
        if version != TRUNK_VERSION {
            return Err(FarmError::Corrupt(format!(
                "unsupported trunk version {}",
                version
            )));
        }
        let count = LittleEndian::read_u64(&bytes[12..20]);
        let body_len = (count as usize)
            .checked_mul(TRUNK_ENTRY_SIZE)
            .and_then(|n| n.checked_add(TRUNK_HDR_SIZE))
            .ok_or_else(|| FarmError::Corrupt(format!("trunk count {} overflows", count)))?;
        if bytes.len() != body_len + 4 {
            return Err(FarmError::Corrupt(format!(
                "trunk length {} (expected {} for {} entries)",
                bytes.len(),
                body_len + 4,
                count
            )));
        }

        let stored_crc = LittleEndian::read_u32(&bytes[body_len..]);
        let mut hasher = Crc32::new();
        hasher.update(&bytes[..body_len]);
        let calc = hasher.finalize();
        if calc != stored_crc {
            return Err(FarmError::Corrupt(format!(
                "trunk CRC mismatch (stored={}, calc={})",
                stored_crc, calc
            )));
        }

        let mut entries = Vec::with_capacity(count as usize);
        for rec in bytes[TRUNK_HDR_SIZE..body_len].chunks_exact(TRUNK_ENTRY_SIZE) {
            entries.push(TrunkEntry {
                oid: LittleEndian::read_u64(&rec[0..8]),
                digest: Digest::from_bytes(&rec[8..28])?,
                size: LittleEndian::read_u64(&rec[28..36]),
            });
        }
        Ok(Trunk { entries })
    }
}

/// Enumerate the live object set of the working store, storing each object's
/// content into the blob store and recording {oid, digest, size} per object,
/// oid ascending. The working store itself is only read; the caller must
/// keep it quiescent for the duration of the scan.
pub fn build_trunk(working: &DefaultBackend, blobs: &BlobStore) -> Result<Trunk> {
    let mut oids = working.list_objects()?;
    oids.sort_unstable();

    let mut entries = Vec::with_capacity(oids.len());
    for oid in oids {
        let bytes = working.read_object(oid)?;
        let digest = blobs.put(&bytes)?;
        entries.push(TrunkEntry {
            oid,
            digest,
            size: bytes.len() as u64,
        });
    }
    debug!("trunk built: {} entries", entries.len());
    Ok(Trunk { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trunk {
        Trunk {
            entries: vec![
                TrunkEntry {
                    oid: 1,
                    digest: Digest::of(b"one"),
                    size: 3,
                },
                TrunkEntry {
                    oid: 0xdeadbeef,
                    digest: Digest::of(b"two"),
                    size: 4096,
                },
            ],
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let t = sample();
        let bytes = t.encode();
        let back = Trunk::decode(&bytes).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn empty_trunk_roundtrip() {
        let t = Trunk::default();
        let back = Trunk::decode(&t.encode()).unwrap();
        assert!(back.entries.is_empty());
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut bytes = sample().encode();
        bytes[0] = b'X';
        assert!(matches!(
            Trunk::decode(&bytes),
            Err(FarmError::Corrupt(_))
        ));
    }

    #[test]
    fn decode_rejects_bad_crc() {
        let mut bytes = sample().encode();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xff;
        assert!(matches!(
            Trunk::decode(&bytes),
            Err(FarmError::Corrupt(_))
        ));
    }

    #[test]
    fn decode_rejects_truncation() {
        let bytes = sample().encode();
        assert!(Trunk::decode(&bytes[..bytes.len() - 1]).is_err());
    }
}
