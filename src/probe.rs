//! Filesystem capability probe.
//!
//! The backend keeps per-object metadata in extended attributes elsewhere in
//! the system, so init refuses base paths whose filesystem reports xattrs as
//! unsupported. The probe reads a reserved attribute name; only an explicit
//! ENOTSUP counts as "unsupported" -- ENODATA and every other outcome count
//! as supported.

use std::path::Path;

#[cfg(target_os = "linux")]
pub fn supports_xattr(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    const PROBE_ATTR: &[u8] = b"user.farmstore.probe\0";

    let c_path = match CString::new(path.as_os_str().as_bytes()) {
        Ok(p) => p,
        // NUL in path: leave the verdict to the open() that follows.
        Err(_) => return true,
    };

    let ret = unsafe {
        libc::getxattr(
            c_path.as_ptr(),
            PROBE_ATTR.as_ptr() as *const libc::c_char,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret >= 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() != Some(libc::ENOTSUP)
}

#[cfg(not(target_os = "linux"))]
pub fn supports_xattr(_path: &Path) -> bool {
    true
}
