//! Object preallocation for a better filesystem layout.
//!
//! Primary path: fallocate(fd, 0, 0, size) to reserve the whole object as
//! one extent. Filesystems that do not support the call (ENOSYS/EOPNOTSUPP)
//! get the portable fallback: write one zeroed sector at the last sector
//! offset, which materializes the final block and commonly triggers extent
//! preallocation as a side effect. Neither path is retried; failures go
//! straight back to the caller's write operation.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

use crate::consts::SECTOR_SIZE;
use crate::error::{FarmError, Result};

#[cfg(target_os = "linux")]
pub fn preallocate(file: &File, size: u64) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    let ret = unsafe { libc::fallocate(file.as_raw_fd(), 0, 0, size as libc::off_t) };
    if ret == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ENOSYS) | Some(libc::EOPNOTSUPP) => write_last_sector(file, size),
        _ => Err(FarmError::System(err)),
    }
}

#[cfg(not(target_os = "linux"))]
pub fn preallocate(file: &File, size: u64) -> Result<()> {
    write_last_sector(file, size)
}

/// Portable fallback: zero-fill the last sector of the object so the file
/// occupies size bytes. Sizes below one sector still get a full sector at
/// offset 0.
pub fn write_last_sector(file: &File, size: u64) -> Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(SECTOR_SIZE)
        .map_err(|_| FarmError::OutOfMemory)?;
    buf.resize(SECTOR_SIZE, 0);

    let off = size.saturating_sub(SECTOR_SIZE as u64);
    let mut f = file;
    f.seek(SeekFrom::Start(off))?;
    f.write_all(&buf)?;
    Ok(())
}
