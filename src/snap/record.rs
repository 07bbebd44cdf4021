//! Snapshot record: the epoch -> trunk association plus the node list that
//! formed the cluster at snapshot time.
//!
//! Blob layout (LE):
//! [magic8 "FARMSNAP"][version u32 = 1][epoch u32][nr_nodes u32][trunk_digest 20]
//! nr_nodes * [addr 16][port u16][nr_vnodes u16][zone u32]
//! [crc32 u32]  -- over everything before it

use byteorder::{ByteOrder, LittleEndian};
use crc32fast::Hasher as Crc32;

use crate::consts::{NODE_ENTRY_SIZE, SNAP_HDR_SIZE, SNAP_MAGIC, SNAP_VERSION};
use crate::digest::Digest;
use crate::error::{FarmError, Result};

/// Cluster-node descriptor carried in a snapshot record. addr holds an IPv6
/// (or v4-mapped) address in network order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeEntry {
    pub addr: [u8; 16],
    pub port: u16,
    pub nr_vnodes: u16,
    pub zone: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub epoch: u32,
    pub nodes: Vec<NodeEntry>,
    pub trunk_digest: Digest,
}

impl SnapshotRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(SNAP_HDR_SIZE + self.nodes.len() * NODE_ENTRY_SIZE + 4);
        let mut b2 = [0u8; 2];
        let mut b4 = [0u8; 4];

        out.extend_from_slice(SNAP_MAGIC);
        LittleEndian::write_u32(&mut b4, SNAP_VERSION);
        out.extend_from_slice(&b4);
        LittleEndian::write_u32(&mut b4, self.epoch);
        out.extend_from_slice(&b4);
        LittleEndian::write_u32(&mut b4, self.nodes.len() as u32);
        out.extend_from_slice(&b4);
        out.extend_from_slice(self.trunk_digest.as_bytes());

        for n in &self.nodes {
            out.extend_from_slice(&n.addr);
            LittleEndian::write_u16(&mut b2, n.port);
            out.extend_from_slice(&b2);
            LittleEndian::write_u16(&mut b2, n.nr_vnodes);
            out.extend_from_slice(&b2);
            LittleEndian::write_u32(&mut b4, n.zone);
            out.extend_from_slice(&b4);
        }

        let mut hasher = Crc32::new();
        hasher.update(&out);
        LittleEndian::write_u32(&mut b4, hasher.finalize());
        out.extend_from_slice(&b4);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SNAP_HDR_SIZE + 4 {
            return Err(FarmError::Corrupt(format!(
                "snapshot blob too short ({} bytes)",
                bytes.len()
            )));
        }
        if &bytes[0..8] != SNAP_MAGIC {
            return Err(FarmError::Corrupt("bad snapshot magic".into()));
        }
        let version = LittleEndian::read_u32(&bytes[8..12]);
        if version != SNAP_VERSION {
            return Err(FarmError::Corrupt(format!(
                "unsupported snapshot version {}",
                version
            )));
        }
        let epoch = LittleEndian::read_u32(&bytes[12..16]);
        let nr_nodes = LittleEndian::read_u32(&bytes[16..20]) as usize;
        let body_len = nr_nodes
            .checked_mul(NODE_ENTRY_SIZE)
            .and_then(|n| n.checked_add(SNAP_HDR_SIZE))
            .ok_or_else(|| {
                FarmError::Corrupt(format!("snapshot node count {} overflows", nr_nodes))
            })?;
        if bytes.len() != body_len + 4 {
            return Err(FarmError::Corrupt(format!(
                "snapshot length {} (expected {} for {} nodes)",
                bytes.len(),
                body_len + 4,
                nr_nodes
            )));
        }

        let stored_crc = LittleEndian::read_u32(&bytes[body_len..]);
        let mut hasher = Crc32::new();
        hasher.update(&bytes[..body_len]);
        let calc = hasher.finalize();
        if calc != stored_crc {
            return Err(FarmError::Corrupt(format!(
                "snapshot CRC mismatch (stored={}, calc={})",
                stored_crc, calc
            )));
        }

        let trunk_digest = Digest::from_bytes(&bytes[20..40])?;

        let mut nodes = Vec::with_capacity(nr_nodes);
        for rec in bytes[SNAP_HDR_SIZE..body_len].chunks_exact(NODE_ENTRY_SIZE) {
            let mut addr = [0u8; 16];
            addr.copy_from_slice(&rec[0..16]);
            nodes.push(NodeEntry {
                addr,
                port: LittleEndian::read_u16(&rec[16..18]),
                nr_vnodes: LittleEndian::read_u16(&rec[18..20]),
                zone: LittleEndian::read_u32(&rec[20..24]),
            });
        }

        Ok(SnapshotRecord {
            epoch,
            nodes,
            trunk_digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SnapshotRecord {
        SnapshotRecord {
            epoch: 7,
            nodes: vec![
                NodeEntry {
                    addr: [0; 16],
                    port: 7000,
                    nr_vnodes: 64,
                    zone: 0,
                },
                NodeEntry {
                    addr: [0xfe; 16],
                    port: 7001,
                    nr_vnodes: 64,
                    zone: 1,
                },
            ],
            trunk_digest: Digest::of(b"trunk"),
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let r = sample();
        let back = SnapshotRecord::decode(&r.encode()).unwrap();
        assert_eq!(r, back);
    }

    #[test]
    fn no_nodes_roundtrip() {
        let r = SnapshotRecord {
            epoch: 1,
            nodes: Vec::new(),
            trunk_digest: Digest::of(b"t"),
        };
        let back = SnapshotRecord::decode(&r.encode()).unwrap();
        assert_eq!(back.epoch, 1);
        assert!(back.nodes.is_empty());
    }

    #[test]
    fn decode_rejects_tampering() {
        let mut bytes = sample().encode();
        bytes[13] ^= 1; // epoch byte
        assert!(matches!(
            SnapshotRecord::decode(&bytes),
            Err(FarmError::Corrupt(_))
        ));
    }
}
