//! Export of the saved-chains data.

use std::io::Write;
use std::path::PathBuf;

use cadena_config::Repository;
use clap::Args;

use super::common::{GlobalArgs, Session};

#[derive(Args)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(global: &GlobalArgs, args: ExportArgs) -> anyhow::Result<()> {
    let session = Session::open(global)?;
    let Some(blob) = session.chains.repository().load_blob()? else {
        anyhow::bail!("Nothing saved yet");
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &blob)?;
            eprintln!(
                "Exported {} chains to {}",
                session.chains.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&blob)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
