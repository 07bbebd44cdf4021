//! On-disk format constants (farm layout, snapshot log, trunk, snapshot record).

// -------- Farm layout --------
// <base>/.farm            farm metadata root (snapshot log lives here)
// <base>/.farm/objects    content-addressed blobs, shards 00..ff
// <base>/obj              working object store (one file per live object)
pub const FARM_DIR: &str = ".farm";
pub const OBJECTS_DIR: &str = "objects";
pub const WORKING_DIR: &str = "obj";
pub const SHARD_COUNT: usize = 256;

// -------- Digests --------
pub const DIGEST_LEN: usize = 20;
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

// -------- Preallocation --------
pub const SECTOR_SIZE: usize = 512;

// -------- Snapshot log --------
// Record (LE): [epoch u32][digest 20] = 24 bytes. No file header; the log is
// a flat array of records readable in one pass.
pub const SNAP_LOG_FILE: &str = "snap_log";
pub const SNAP_LOG_REC_SIZE: usize = 4 + DIGEST_LEN;

// -------- Trunk blob --------
// Layout (LE):
// [magic8 "FARMTRNK"][version u32 = 1][count u64]
// count * [oid u64][digest 20][size u64]
// [crc32 u32]  -- over header + entries
pub const TRUNK_MAGIC: &[u8; 8] = b"FARMTRNK";
pub const TRUNK_VERSION: u32 = 1;
pub const TRUNK_HDR_SIZE: usize = 8 + 4 + 8;
pub const TRUNK_ENTRY_SIZE: usize = 8 + DIGEST_LEN + 8;

// -------- Snapshot record blob --------
// Layout (LE):
// [magic8 "FARMSNAP"][version u32 = 1][epoch u32][nr_nodes u32][trunk_digest 20]
// nr_nodes * [addr 16][port u16][nr_vnodes u16][zone u32]
// [crc32 u32]  -- over everything before it
pub const SNAP_MAGIC: &[u8; 8] = b"FARMSNAP";
pub const SNAP_VERSION: u32 = 1;
pub const SNAP_HDR_SIZE: usize = 8 + 4 + 4 + 4 + DIGEST_LEN;
pub const NODE_ENTRY_SIZE: usize = 16 + 2 + 2 + 4;

// -------- Default backend --------
// Preallocation size for newly created objects (overridable via config).
pub const DEFAULT_OBJECT_SIZE: u64 = 4 * 1024 * 1024;
