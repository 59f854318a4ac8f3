//! Settings and file locations.

use cadena_config::{Settings, paths};
use clap::Args;

use super::common::GlobalArgs;

#[derive(Args)]
pub struct SettingsArgs {
    /// Write the default settings file if none exists
    #[arg(long)]
    init: bool,
}

pub fn run(global: &GlobalArgs, args: SettingsArgs) -> anyhow::Result<()> {
    let path = global.config.clone().unwrap_or_else(paths::settings_path);

    if args.init {
        if path.exists() {
            println!("Settings already exist at {}", path.display());
        } else {
            Settings::default().save(&path)?;
            println!("Wrote default settings to {}", path.display());
        }
    }

    let settings = global.settings()?;
    println!("Settings file:  {}", path.display());
    println!("Data file:      {}", settings.data_file.display());
    println!("Render output:  {}", settings.render.output_dir.display());
    println!();
    print!("{}", settings.to_toml()?);
    Ok(())
}
