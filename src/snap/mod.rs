//! Epoch snapshots.
//!
//! Components:
//! - log: the append-only snapshot log (<farm_dir>/snap_log), fixed 24-byte
//!   records keyed by epoch.
//! - record: the snapshot record blob (epoch + node list + trunk digest).
//! - writer: capture the working object set at the next epoch.
//! - resolve: snapshot log entry -> snapshot record -> trunk digest.

pub mod log;
pub mod record;
pub mod resolve;
pub mod writer;

pub use self::log::{SnapLog, SnapshotLogEntry};
pub use record::{NodeEntry, SnapshotRecord};
pub use resolve::resolve_trunk_digest;
pub use writer::write_snapshot;
