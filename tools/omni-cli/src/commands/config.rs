//! Configuration commands.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use omni_core::StoreConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::Settings;
use crate::output::Output;

/// Run the config command. Works without opening the store.
pub fn run(args: ConfigArgs, settings: &Settings, output: &Output) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(settings, output),
        ConfigCommand::Init { path, force } => init(&path, force, output),
    }
}

fn show(settings: &Settings, output: &Output) -> Result<()> {
    let config = settings.store_config()?;

    if output.is_json() {
        output.json(&config);
        return Ok(());
    }

    output.header("Effective configuration");
    println!("{}", config.to_toml()?);
    Ok(())
}

fn init(path: &Path, force: bool, output: &Output) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let content = StoreConfig::default().to_toml()?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    output.success(&format!("Wrote {}", path.display()));
    Ok(())
}
