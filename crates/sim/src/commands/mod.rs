//! Simulation subcommands.

mod catalog;
mod run;

pub use catalog::Catalog;
pub use run::Run;

use std::path::PathBuf;

use anyhow::Result;
use stacker_content::ContentFactory;
use stacker_runtime::RuntimeConfig;

/// Environment config, with an explicit data directory taking precedence.
pub(crate) fn load_config(data_dir: Option<PathBuf>) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_env()?;
    if let Some(dir) = data_dir {
        config.stacker = ContentFactory::new(&dir).load_config()?;
        config.content_dir = Some(dir);
    }
    Ok(config)
}
