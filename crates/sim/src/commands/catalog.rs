use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use stacker_content::{ContentFactory, SettingsLoader};
use stacker_core::{EntityKind, SettingsProvider, StackBehavior};
use strum::IntoEnumIterator;

/// Print the per-type stack settings in effect
#[derive(Parser, Debug)]
pub struct Catalog {
    /// Content directory; shipped content when omitted
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Include types with stacking disabled or no settings
    #[arg(long)]
    pub all: bool,
}

impl Catalog {
    pub fn execute(self) -> Result<()> {
        let config = super::load_config(self.data_dir)?;
        let table = match &config.content_dir {
            Some(dir) => ContentFactory::new(dir).load_settings()?,
            None => SettingsLoader::default_table()?,
        };

        println!(
            "{:<16} {:>7} {:>5} {:>9} {:<8} behavior",
            "kind", "enabled", "max", "sensitive", "movement"
        );
        for kind in EntityKind::iter() {
            let Some(settings) = table.settings(kind) else {
                if self.all {
                    println!("{:<16} {:>7}", kind, "-");
                }
                continue;
            };
            if !settings.enabled && !self.all {
                continue;
            }

            let movement = match (settings.type_data.flying, settings.type_data.swimming) {
                (true, _) => "flying",
                (_, true) => "swimming",
                _ => "ground",
            };
            let behavior = match settings.behavior {
                StackBehavior::Standard => "standard".to_owned(),
                StackBehavior::Splitting {
                    loot_size,
                    settle_size,
                } => format!("splitting (loot {loot_size}, settle {settle_size})"),
            };

            println!(
                "{:<16} {:>7} {:>5} {:>9} {:<8} {}",
                kind,
                settings.enabled,
                settings.max_stack_size,
                settings.sensitive,
                movement,
                behavior
            );
        }
        Ok(())
    }
}
