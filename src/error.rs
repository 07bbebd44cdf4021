//! Error taxonomy for the farm backend.
//!
//! One tagged enum instead of a single overloaded status code: "no snapshot
//! for that epoch" and "the disk broke" are different failures and callers
//! handle them differently. Low-level failures are never retried here; the
//! first error propagates to the caller.

use std::io;

pub type Result<T> = std::result::Result<T, FarmError>;

#[derive(Debug, thiserror::Error)]
pub enum FarmError {
    /// Read/write/allocate/directory failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Buffer allocation failure in the preallocation fallback.
    #[error("out of memory")]
    OutOfMemory,

    /// No snapshot log entry for the requested epoch, or a referenced blob
    /// is absent from the content store.
    #[error("not found: {0}")]
    NotFound(String),

    /// A system call failed for a reason other than "not implemented" /
    /// "not supported" (e.g. permission).
    #[error("system error: {0}")]
    System(io::Error),

    /// A required precondition is missing (detected at init), or the backend
    /// is used in a way its configuration does not allow.
    #[error("configuration error: {0}")]
    Config(String),

    /// Stored bytes failed magic/version/CRC/digest validation.
    #[error("corrupt data: {0}")]
    Corrupt(String),
}
