//! Chain editing commands.
//!
//! Slots are addressed by 1-based position. Every command saves the edited
//! chain before returning.

use std::path::PathBuf;

use cadena_core::{EffectKind, SLOT_COUNT};
use cadena_io::WavLoader;
use clap::Args;

use super::common::{
    GlobalArgs, Session, apply_params, parse_effect, parse_key_val, slot_id, slot_index,
};

#[derive(Args)]
pub struct InsertArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// Effect to insert (reverb, distortion, delay, equalizer)
    effect: String,

    /// Slot position (default: first empty slot)
    #[arg(short, long)]
    slot: Option<usize>,

    /// Effect parameters (e.g., "feedback=20")
    #[arg(short, long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, String)>,
}

#[derive(Args)]
pub struct SlotArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// Slot position (1-6)
    slot: usize,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// Slot to move (1-6)
    from: usize,

    /// Destination position (1-6)
    to: usize,
}

#[derive(Args)]
pub struct SetArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// Slot position (1-6)
    slot: usize,

    /// Parameters to set (e.g., "wetDryMix=35" "preset=Large hall")
    #[arg(required = true, value_parser = parse_key_val)]
    params: Vec<(String, String)>,
}

#[derive(Args)]
pub struct VolumeArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// Player volume, 0.0 to 1.0
    volume: f32,
}

#[derive(Args)]
pub struct OpenArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// WAV file to use as the chain's source
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

pub fn insert(global: &GlobalArgs, args: InsertArgs) -> anyhow::Result<()> {
    let effect = parse_effect(&args.effect)?;
    let mut session = Session::open(global)?;

    session.edit(&args.chain, |chain| {
        let index = match args.slot {
            Some(position) => slot_index(position)?,
            None => chain
                .next_insert_index()
                .ok_or_else(|| anyhow::anyhow!("All {SLOT_COUNT} slots are in use"))?,
        };
        let slot = chain.insert_effect(index, EffectKind::new(effect))?;
        println!("Slot {}: {effect}", index + 1);
        apply_params(chain, slot, &args.param)
    })
}

pub fn clear(global: &GlobalArgs, args: SlotArgs) -> anyhow::Result<()> {
    let mut session = Session::open(global)?;
    session.edit(&args.chain, |chain| {
        let slot = slot_id(chain, args.slot)?;
        chain.clear_slot(slot);
        println!("Cleared slot {}", args.slot);
        Ok(())
    })
}

pub fn move_slot(global: &GlobalArgs, args: MoveArgs) -> anyhow::Result<()> {
    let from = slot_index(args.from)?;
    let to = slot_index(args.to)?;
    let mut session = Session::open(global)?;
    session.edit(&args.chain, |chain| {
        if chain.move_slot(from, to)? {
            println!("Moved slot {} to {}", args.from, args.to);
        } else {
            println!("Slot {} is already at {}", args.from, args.to);
        }
        Ok(())
    })
}

pub fn bypass(global: &GlobalArgs, args: SlotArgs) -> anyhow::Result<()> {
    let mut session = Session::open(global)?;
    session.edit(&args.chain, |chain| {
        let slot = slot_id(chain, args.slot)?;
        match chain.toggle_bypass(slot) {
            Some(true) => println!("Slot {}: bypassed", args.slot),
            Some(false) => println!("Slot {}: active", args.slot),
            None => anyhow::bail!("Slot {} is empty", args.slot),
        }
        Ok(())
    })
}

pub fn set(global: &GlobalArgs, args: SetArgs) -> anyhow::Result<()> {
    let mut session = Session::open(global)?;
    session.edit(&args.chain, |chain| {
        let slot = slot_id(chain, args.slot)?;
        println!("Slot {}:", args.slot);
        apply_params(chain, slot, &args.params)
    })
}

pub fn volume(global: &GlobalArgs, args: VolumeArgs) -> anyhow::Result<()> {
    if !args.volume.is_finite() {
        anyhow::bail!("Invalid volume: {}", args.volume);
    }
    let mut session = Session::open(global)?;
    session.edit(&args.chain, |chain| {
        chain.set_volume(args.volume);
        println!("Volume: {:.2}", chain.volume());
        Ok(())
    })
}

pub fn open(global: &GlobalArgs, args: OpenArgs) -> anyhow::Result<()> {
    let path = std::path::absolute(&args.file)?;
    let mut session = Session::open(global)?;
    session.edit(&args.chain, |chain| {
        chain.load_file(&path, &WavLoader)?;
        if let Some(source) = chain.source() {
            println!(
                "Loaded {} ({} ch, {} Hz, {:.2}s)",
                path.display(),
                source.format().channels,
                source.format().sample_rate,
                source.duration_secs()
            );
        }
        Ok(())
    })
}
