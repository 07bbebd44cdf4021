use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use farmstore::{ensure_layout, Digest, SnapLog};

/// Unique root path per test run.
fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("farm-{}-{}-{}", prefix, pid, t))
}

fn open_log(prefix: &str) -> Result<(PathBuf, SnapLog)> {
    let root = unique_root(prefix);
    fs::create_dir_all(&root)?;
    let paths = ensure_layout(&root)?;
    let log = SnapLog::open(&paths.farm_dir)?;
    Ok((root, log))
}

#[test]
fn append_read_roundtrip() -> Result<()> {
    let (_root, log) = open_log("log")?;
    assert!(log.is_empty()?);

    let d1 = Digest::of(b"snap-1");
    let d2 = Digest::of(b"snap-2");
    log.append(1, &d1)?;
    log.append(2, &d2)?;

    assert_eq!(log.len()?, 2);
    let entries = log.read_all()?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].epoch, 1);
    assert_eq!(entries[0].digest, d1);
    assert_eq!(entries[1].epoch, 2);
    assert_eq!(entries[1].digest, d2);

    Ok(())
}

#[test]
fn export_is_verbatim() -> Result<()> {
    let (_root, log) = open_log("log-export")?;
    log.append(1, &Digest::of(b"a"))?;
    log.append(2, &Digest::of(b"b"))?;

    let raw = log.export()?;
    assert_eq!(raw.len(), 2 * 24, "two fixed 24-byte records");
    // First field of the first record: epoch 1 (LE u32).
    assert_eq!(&raw[0..4], &[1, 0, 0, 0]);
    assert_eq!(&raw[4..24], Digest::of(b"a").as_bytes());
    Ok(())
}

#[test]
fn torn_tail_is_skipped_and_overwritten() -> Result<()> {
    let (_root, log) = open_log("log-torn")?;
    log.append(1, &Digest::of(b"one"))?;

    // Simulate a crash mid-append: a partial record at the tail.
    {
        let mut f = fs::OpenOptions::new().append(true).open(log.path())?;
        f.write_all(&[0xEE; 10])?;
    }
    assert_eq!(log.len()?, 1, "torn tail must not count");
    assert_eq!(log.read_all()?.len(), 1);

    // The next append lands over the torn tail and realigns the file.
    let d2 = Digest::of(b"two");
    log.append(2, &d2)?;
    assert_eq!(log.len()?, 2);
    let entries = log.read_all()?;
    assert_eq!(entries[1].epoch, 2);
    assert_eq!(entries[1].digest, d2);
    assert_eq!(log.export()?.len(), 2 * 24, "file realigned to records");

    Ok(())
}
