use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use genesys_core::registry::DeviceRegistry;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the registry to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save the model registry as TOML.
pub fn run(args: &ConfigArgs, registry: &DeviceRegistry) -> Result<()> {
    let toml_str = registry.to_toml_string()?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write registry to {}", path.display()))?;
        println!("Registry saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
