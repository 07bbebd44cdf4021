use std::path::Path;

/// fsync the parent directory of path (durable rename on unix). On other
/// platforms this is a no-op.
#[cfg(unix)]
pub fn fsync_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = std::fs::File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn fsync_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Parse an object id: plain hex, optionally 0x-prefixed, or decimal with a
/// 0d prefix for operator convenience.
pub fn parse_oid(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(x) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(x, 16).map_err(|e| e.to_string())
    } else if let Some(x) = s.strip_prefix("0d") {
        x.parse::<u64>().map_err(|e| e.to_string())
    } else {
        u64::from_str_radix(s, 16).map_err(|e| e.to_string())
    }
}
