//! Offline render command.

use std::path::PathBuf;
use std::time::Duration;

use cadena_config::paths;
use cadena_core::{RenderError, RenderTask};
use cadena_io::WavSink;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use super::common::{GlobalArgs, Session};

#[derive(Args)]
pub struct RenderArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// Output WAV file (default: "<source>-processed.wav" in the render directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum frames per render chunk (overrides the settings)
    #[arg(long)]
    block_size: Option<usize>,
}

pub fn run(global: &GlobalArgs, args: RenderArgs) -> anyhow::Result<()> {
    let mut session = Session::open(global)?;
    let id = session.resolve(&args.chain)?;

    let chain = session
        .chains
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Chain '{}' not found", args.chain))?;
    let Some(source) = chain.source() else {
        anyhow::bail!(
            "Chain '{}' has no source file loaded. Use 'cadena open' first.",
            chain.name()
        );
    };
    let format = source.format();
    let total_frames = source.frames();

    let output = match args.output {
        Some(path) => path,
        None => {
            let dir = &session.settings.render.output_dir;
            paths::ensure_dir(dir)?;
            paths::render_output_path(dir, source.path())
        }
    };

    let mut options = session.settings.render_options();
    if let Some(block_size) = args.block_size {
        options.block_size = block_size.max(1);
    }

    println!(
        "Rendering '{}' ({} frames, {} ch, {} Hz)...",
        chain.name(),
        total_frames,
        format.channels,
        format.sample_rate
    );

    let sink = WavSink::create(&output, format)?;
    let Some((index, chain)) = session.chains.take(&id) else {
        anyhow::bail!("Chain '{}' not found", args.chain);
    };
    let task = RenderTask::spawn(chain, sink, options)?;

    let cancel = task.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling...");
        cancel.cancel();
    })?;

    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    while !task.is_finished() {
        pb.set_position(task.progress().frames_rendered);
        std::thread::sleep(Duration::from_millis(50));
    }

    let outcome = task.join()?;
    session.chains.reinsert(index, outcome.chain);

    match outcome.result {
        Ok(summary) => {
            pb.set_position(summary.frames);
            pb.finish_with_message("done");
            println!("Wrote {} ({} frames)", summary.path.display(), summary.frames);
            Ok(())
        }
        Err(RenderError::Cancelled) => {
            pb.abandon();
            println!("Render cancelled; partial output removed.");
            Ok(())
        }
        Err(err) => {
            pb.abandon();
            Err(err.into())
        }
    }
}
