//! Runtime configuration structures and environment loading.
use std::env;
use std::path::{Path, PathBuf};

use stacker_content::{ConfigLoader, ContentFactory};
use stacker_core::StackerConfig;

use crate::error::{Result, RuntimeError};

pub const DEFAULT_DESIGNATED_THREAD_NAME: &str = "stacker-designated";
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Configuration required to start a [`StackerRuntime`](crate::StackerRuntime).
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Threads in the loot computation pool.
    pub worker_threads: usize,
    pub designated_thread_name: String,
    /// Directory holding `config.toml`, `entity_settings.ron` and
    /// `locale.toml`. Missing files fall back to the shipped defaults.
    pub content_dir: Option<PathBuf>,
    pub stacker: StackerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            designated_thread_name: DEFAULT_DESIGNATED_THREAD_NAME.to_owned(),
            content_dir: None,
            stacker: StackerConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `STACKER_WORKER_THREADS` - Loot worker pool size (default: 2)
    /// - `STACKER_DESIGNATED_THREAD_NAME` - Name of the designated thread
    /// - `STACKER_DATA_DIR` - Content directory (default: shipped content)
    /// - `STACKER_CONFIG` - Engine config file, overriding the content directory's
    /// - `STACKER_LOOT_ASYNC` - Compute loot on the worker pool (default: from config)
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(threads) = parse::<usize>(&lookup, "STACKER_WORKER_THREADS") {
            config.worker_threads = threads.max(1);
        }

        if let Some(name) = lookup("STACKER_DESIGNATED_THREAD_NAME").filter(|n| !n.is_empty()) {
            config.designated_thread_name = name;
        }

        config.content_dir = lookup("STACKER_DATA_DIR").map(PathBuf::from);

        config.stacker = match (lookup("STACKER_CONFIG"), &config.content_dir) {
            (Some(path), _) => ConfigLoader::load(Path::new(&path)).map_err(RuntimeError::Content)?,
            (None, Some(dir)) => ContentFactory::new(dir)
                .load_config()
                .map_err(RuntimeError::Content)?,
            (None, None) => StackerConfig::default(),
        };

        if let Some(compute_async) = parse::<bool>(&lookup, "STACKER_LOOT_ASYNC") {
            config.stacker.loot.compute_async = compute_async;
        }

        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}
