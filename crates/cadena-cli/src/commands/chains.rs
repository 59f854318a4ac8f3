//! Chain management commands: list, show, add, remove, rename.

use cadena_config::codec;
use cadena_core::{Chain, ChainParts, Endpoint, SLOT_COUNT};
use clap::Args;

use super::common::{GlobalArgs, Session};

#[derive(Args)]
pub struct ShowArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// Print the chain as it is saved, in JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Name for the new chain (default: next free "Queue N")
    #[arg(short, long)]
    name: Option<String>,

    /// Copy slots, volume and source from an existing chain
    #[arg(long, value_name = "CHAIN")]
    from: Option<String>,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Chain position (1-based), id or name
    chain: String,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Chain position (1-based), id or name
    chain: String,

    /// New name
    name: String,
}

pub fn list(global: &GlobalArgs) -> anyhow::Result<()> {
    let session = Session::open(global)?;

    println!("Saved chains ({}):\n", session.chains.len());
    for (i, chain) in session.chains.iter().enumerate() {
        let source = chain
            .source_ref()
            .and_then(|p| p.file_name())
            .map_or_else(|| "-".to_string(), |n| n.to_string_lossy().into_owned());
        println!(
            "  {:>2}. {:<24} {}/{} effects  vol {:.2}  {}",
            i + 1,
            chain.name(),
            chain.active_slot_count(),
            SLOT_COUNT,
            chain.volume(),
            source
        );
    }
    Ok(())
}

pub fn show(global: &GlobalArgs, args: ShowArgs) -> anyhow::Result<()> {
    let session = Session::open(global)?;
    let chain = session.chain(&args.chain)?;

    if args.json {
        let record = codec::encode_chain(chain);
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    print_chain(chain);
    Ok(())
}

fn print_chain(chain: &Chain) {
    println!("{}", chain.name());
    println!("  id:     {}", chain.id());
    println!("  volume: {:.2}", chain.volume());
    match (chain.source(), chain.source_ref()) {
        (Some(source), _) => println!(
            "  source: {} ({} ch, {} Hz, {:.2}s)",
            source.path().display(),
            source.format().channels,
            source.format().sample_rate,
            source.duration_secs()
        ),
        (None, Some(path)) => println!("  source: {} (not loaded)", path.display()),
        (None, None) => println!("  source: none"),
    }

    println!("\nSlots:");
    for (i, slot) in chain.slots().iter().enumerate() {
        println!("  {}. {}", i + 1, slot.kind().summary());
    }

    let path: Vec<String> = chain
        .routing()
        .connections()
        .iter()
        .map(|(from, _)| match from {
            Endpoint::Source => "source".to_string(),
            Endpoint::Node(id) => chain
                .slot(*id)
                .and_then(|s| s.effect_type())
                .map_or_else(|| id.to_string(), |t| t.name().to_string()),
            Endpoint::Output => "output".to_string(),
        })
        .chain(std::iter::once("output".to_string()))
        .collect();
    println!("\nRouting: {}", path.join(" → "));
}

pub fn add(global: &GlobalArgs, args: AddArgs) -> anyhow::Result<()> {
    let mut session = Session::open(global)?;

    let template = match &args.from {
        Some(key) => session.chain(key)?.to_parts(),
        None => ChainParts::blank(),
    };
    let chain = session.chains.add(&template)?;
    let id = chain.id().clone();

    if let Some(name) = &args.name {
        session.chains.rename(&id, name)?;
    }

    if let Some(chain) = session.chains.get(&id) {
        println!("Added chain {}: {}", session.chains.len(), chain.name());
    }
    Ok(())
}

pub fn remove(global: &GlobalArgs, args: RemoveArgs) -> anyhow::Result<()> {
    let mut session = Session::open(global)?;
    let chain = session.chain(&args.chain)?;
    let (id, name) = (chain.id().clone(), chain.name().to_string());

    if session.chains.remove(&id)? {
        println!("Removed chain: {name}");
    }
    Ok(())
}

pub fn rename(global: &GlobalArgs, args: RenameArgs) -> anyhow::Result<()> {
    let mut session = Session::open(global)?;
    let id = session.resolve(&args.chain)?;
    session.chains.rename(&id, &args.name)?;
    println!("Renamed to: {}", args.name.trim());
    Ok(())
}
