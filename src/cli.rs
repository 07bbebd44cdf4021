use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use crate::backend::{FarmBackend, StoreBackend};
use crate::config::FarmConfig;
use crate::util::parse_oid;

#[derive(Parser, Debug)]
#[command(
    name = "farmstore",
    version,
    about = "Epoch-snapshot object store backend (content-addressed blobs + snapshot log)",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Initialize a store root (farm layout + working dir).
    Init {
        #[arg(long)]
        path: PathBuf,
    },
    /// Snapshot the current object set at the next epoch.
    Snapshot {
        #[arg(long)]
        path: PathBuf,
    },
    /// List snapshot log entries.
    Log {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Restore the working object set to a snapshotted epoch (destructive).
    Restore {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        epoch: u32,
    },
    /// Export the raw snapshot log to a file.
    GetSnapFile {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Store counters (objects, blobs, snapshots) as JSON.
    Stat {
        #[arg(long)]
        path: PathBuf,
    },
    /// Put a whole object from a file (atomic replace).
    Put {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, value_parser = parse_oid)]
        oid: u64,
        #[arg(long)]
        file: PathBuf,
    },
    /// Read a whole object to stdout.
    Get {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, value_parser = parse_oid)]
        oid: u64,
    },
    /// Remove an object from the working store.
    Remove {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, value_parser = parse_oid)]
        oid: u64,
    },
}

fn open_farm(path: &PathBuf) -> Result<FarmBackend> {
    let mut b = FarmBackend::new(path, FarmConfig::from_env());
    b.init()
        .with_context(|| format!("init farm backend at {}", path.display()))?;
    Ok(b)
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Init { path } => {
            fs::create_dir_all(&path)
                .with_context(|| format!("create store root {}", path.display()))?;
            let b = open_farm(&path)?;
            let paths = b
                .paths()
                .ok_or_else(|| anyhow!("farm backend reported no paths after init"))?;
            println!("initialized farm store at {}", path.display());
            println!("  metadata: {}", paths.farm_dir.display());
            println!("  blobs:    {}", paths.objects_dir.display());
        }

        Cmd::Snapshot { path } => {
            let b = open_farm(&path)?;
            // Membership is owned by the cluster layer; a standalone
            // snapshot records an empty node list.
            let (epoch, digest) = b.snapshot(&[])?;
            println!("epoch {} -> {}", epoch, digest);
        }

        Cmd::Log { path, json } => {
            let b = open_farm(&path)?;
            let entries = b.snap_log_entries()?;
            if json {
                let rows: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "epoch": e.epoch,
                            "snapshot": e.digest.to_hex(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for e in &entries {
                    println!("epoch {:>6}  {}", e.epoch, e.digest);
                }
                println!("{} snapshot(s)", entries.len());
            }
        }

        Cmd::Restore { path, epoch } => {
            let b = open_farm(&path)?;
            b.restore(epoch)
                .with_context(|| format!("restore to epoch {}", epoch))?;
            println!("restored to epoch {}", epoch);
        }

        Cmd::GetSnapFile { path, out } => {
            let b = open_farm(&path)?;
            let bytes = b.get_snap_file()?;
            fs::write(&out, &bytes).with_context(|| format!("write {}", out.display()))?;
            println!("{} bytes -> {}", bytes.len(), out.display());
        }

        Cmd::Stat { path } => {
            let b = open_farm(&path)?;
            let stat = b.stat()?;
            println!("{}", serde_json::to_string_pretty(&stat)?);
        }

        Cmd::Put { path, oid, file } => {
            let b = open_farm(&path)?;
            let data = fs::read(&file).with_context(|| format!("read {}", file.display()))?;
            b.atomic_put(oid, &data)?;
            println!("object {:016x}: {} bytes", oid, data.len());
        }

        Cmd::Get { path, oid } => {
            let b = open_farm(&path)?;
            let data = b.read_object(oid)?;
            std::io::stdout().write_all(&data)?;
        }

        Cmd::Remove { path, oid } => {
            let b = open_farm(&path)?;
            b.remove_object(oid)?;
            println!("object {:016x} removed", oid);
        }
    }

    Ok(())
}
