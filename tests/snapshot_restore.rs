use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use farmstore::{
    build_trunk, ensure_layout, resolve_trunk_digest, write_snapshot, BlobStore, DefaultBackend,
    Digest, FarmBackend, FarmConfig, FarmError, SnapLog, StoreBackend, Trunk,
};

/// Unique root path per test run.
fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("farm-{}-{}-{}", prefix, pid, t))
}

/// Farm components over a fresh root, the way the adapter wires them.
fn components(prefix: &str) -> Result<(PathBuf, DefaultBackend, BlobStore, SnapLog)> {
    let root = unique_root(prefix);
    fs::create_dir_all(&root)?;
    let paths = ensure_layout(&root)?;
    let working = DefaultBackend::new(&root, FarmConfig::default());
    working.init_dirs()?;
    let blobs = BlobStore::open(&paths.objects_dir)?;
    let log = SnapLog::open(&paths.farm_dir)?;
    Ok((root, working, blobs, log))
}

fn blob_path(root: &PathBuf, digest: &Digest) -> PathBuf {
    let hex = digest.to_hex();
    root.join(".farm")
        .join("objects")
        .join(&hex[0..2])
        .join(&hex[2..])
}

#[test]
fn epochs_are_assigned_sequentially() -> Result<()> {
    let (_root, working, blobs, log) = components("epochs")?;
    working.atomic_put_object(1, b"object one")?;

    for want in 1..=3u32 {
        let (epoch, _digest) = write_snapshot(&working, &blobs, &log, &[])?;
        assert_eq!(epoch, want, "epochs must be 1,2,... with no gaps");
    }
    assert_eq!(log.len()?, 3);

    let entries = log.read_all()?;
    let epochs: Vec<u32> = entries.iter().map(|e| e.epoch).collect();
    assert_eq!(epochs, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn snapshot_resolves_to_identical_trunk() -> Result<()> {
    let (_root, working, blobs, log) = components("roundtrip")?;
    working.atomic_put_object(0x10, b"alpha")?;
    working.atomic_put_object(0x02, b"beta")?;

    // What the writer will capture: same scan, same ordering.
    let expected = build_trunk(&working, &blobs)?;
    let expected_bytes = expected.encode();

    let (epoch, _snap_digest) = write_snapshot(&working, &blobs, &log, &[])?;
    let trunk_digest = resolve_trunk_digest(&log, &blobs, epoch)?;
    assert_eq!(trunk_digest, Digest::of(&expected_bytes));

    let stored = blobs
        .get(&trunk_digest)?
        .expect("trunk blob must be readable");
    assert_eq!(stored, expected_bytes, "trunk blob must be byte-identical");

    // One entry per object, oid ascending, digests of current content.
    let trunk = Trunk::decode(&stored)?;
    assert_eq!(trunk.entries.len(), 2);
    assert_eq!(trunk.entries[0].oid, 0x02);
    assert_eq!(trunk.entries[0].digest, Digest::of(b"beta"));
    assert_eq!(trunk.entries[0].size, 4);
    assert_eq!(trunk.entries[1].oid, 0x10);
    assert_eq!(trunk.entries[1].digest, Digest::of(b"alpha"));

    Ok(())
}

#[test]
fn restore_replaces_working_set() -> Result<()> {
    let root = unique_root("restore");
    fs::create_dir_all(&root)?;

    let mut b = FarmBackend::new(&root, FarmConfig::default());
    b.init()?;

    b.atomic_put(0xA, b"content A")?;
    b.atomic_put(0xB, b"content B")?;
    let (epoch, _digest) = b.snapshot(&[])?;
    assert_eq!(epoch, 1);

    // Mutate the working set after the snapshot.
    b.remove_object(0xB)?;
    b.atomic_put(0xC, b"content C")?;
    assert!(!b.exist(0xB)?);
    assert!(b.exist(0xC)?);

    b.restore(1)?;

    assert!(b.exist(0xA)?, "A must survive restore");
    assert!(b.exist(0xB)?, "B must be brought back");
    assert!(!b.exist(0xC)?, "C postdates the snapshot");
    assert_eq!(b.read_object(0xA)?, b"content A");
    assert_eq!(b.read_object(0xB)?, b"content B");

    Ok(())
}

#[test]
fn restore_of_unknown_epoch_is_not_found() -> Result<()> {
    let root = unique_root("restore-miss");
    fs::create_dir_all(&root)?;

    let mut b = FarmBackend::new(&root, FarmConfig::default());
    b.init()?;
    b.atomic_put(1, b"x")?;

    let err = b.restore(42).err().expect("unknown epoch must fail");
    assert!(
        matches!(err, FarmError::NotFound(_)),
        "unexpected error: {err:?}"
    );
    Ok(())
}

#[test]
fn restore_with_missing_blob_fails_loudly() -> Result<()> {
    let root = unique_root("restore-fatal");
    fs::create_dir_all(&root)?;

    let mut b = FarmBackend::new(&root, FarmConfig::default());
    b.init()?;

    b.atomic_put(1, b"kept")?;
    b.atomic_put(2, b"doomed")?;
    let (epoch, _digest) = b.snapshot(&[])?;

    // Sabotage: remove the content blob a trunk entry references.
    let doomed = blob_path(&root, &Digest::of(b"doomed"));
    assert!(doomed.is_file(), "content blob must exist after snapshot");
    fs::remove_file(&doomed)?;

    let err = b.restore(epoch).err().expect("restore must not succeed");
    assert!(
        matches!(err, FarmError::NotFound(_)),
        "unexpected error: {err:?}"
    );
    Ok(())
}

#[test]
fn get_snap_file_exports_the_log() -> Result<()> {
    let root = unique_root("snapfile");
    fs::create_dir_all(&root)?;

    let mut b = FarmBackend::new(&root, FarmConfig::default());
    b.init()?;
    b.atomic_put(7, b"payload")?;
    b.snapshot(&[])?;
    b.snapshot(&[])?;

    let raw = b.get_snap_file()?;
    assert_eq!(raw.len(), 2 * 24, "two fixed 24-byte log records");
    let on_disk = fs::read(root.join(".farm").join("snap_log"))?;
    assert_eq!(raw, on_disk, "export must be verbatim");
    Ok(())
}

#[test]
fn restore_never_touches_farm_metadata() -> Result<()> {
    let root = unique_root("disjoint");
    fs::create_dir_all(&root)?;

    let mut b = FarmBackend::new(&root, FarmConfig::default());
    b.init()?;
    b.atomic_put(1, b"one")?;
    let (epoch, _d) = b.snapshot(&[])?;

    let blobs_before: u64 = b.stat()?.blobs;
    b.restore(epoch)?;

    assert_eq!(b.stat()?.blobs, blobs_before, "restore must not GC blobs");
    assert!(root.join(".farm").join("snap_log").is_file());
    Ok(())
}
