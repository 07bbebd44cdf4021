//! Centralized configuration for the farm backend.
//!
//! Tunables live in one struct instead of scattered env lookups. A
//! FarmConfig is built once at startup (Default or from_env) and passed by
//! value into backend constructors; nothing reads the environment after
//! that point.

#[derive(Clone, Debug)]
pub struct FarmConfig {
    /// Preallocation size in bytes for newly created objects.
    /// Env: FARM_OBJECT_SIZE (default 4 MiB)
    pub object_size: u64,

    /// fsync object files on every in-place write. atomic_put always syncs
    /// regardless of this flag.
    /// Env: FARM_DATA_FSYNC (default false; "1|true|on|yes" => true)
    pub data_fsync: bool,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            object_size: crate::consts::DEFAULT_OBJECT_SIZE,
            data_fsync: false,
        }
    }
}

impl FarmConfig {
    /// Load configuration from environment variables. Unparsable values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FARM_OBJECT_SIZE") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.object_size = n;
            }
        }

        if let Ok(v) = std::env::var("FARM_DATA_FSYNC") {
            let s = v.trim().to_ascii_lowercase();
            cfg.data_fsync = s == "1" || s == "true" || s == "on" || s == "yes";
        }

        cfg
    }
}
