//! Cadena CLI - command-line front end for the effect-chain editor.

mod commands;

use clap::{Parser, Subcommand};
use commands::common::GlobalArgs;

#[derive(Parser)]
#[command(name = "cadena")]
#[command(author, version, about = "Cadena effect-chain editor", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved chains
    List,

    /// Show a chain's slots, source and routing
    Show(commands::chains::ShowArgs),

    /// Add a new chain
    Add(commands::chains::AddArgs),

    /// Remove a chain
    Remove(commands::chains::RemoveArgs),

    /// Rename a chain
    Rename(commands::chains::RenameArgs),

    /// Put an effect into a slot
    Insert(commands::edit::InsertArgs),

    /// Empty a slot
    Clear(commands::edit::SlotArgs),

    /// Move a slot to another position
    Move(commands::edit::MoveArgs),

    /// Toggle a slot's bypass
    Bypass(commands::edit::SlotArgs),

    /// Set effect parameters in a slot
    Set(commands::edit::SetArgs),

    /// Set a chain's player volume
    Volume(commands::edit::VolumeArgs),

    /// Load a WAV file as a chain's source
    Open(commands::edit::OpenArgs),

    /// Render a chain's source through its effects to a WAV file
    Render(commands::render::RenderArgs),

    /// Write the saved-chains data as JSON
    Export(commands::export::ExportArgs),

    /// List available effects and their parameters
    Effects(commands::effects::EffectsArgs),

    /// Show settings and file locations
    Settings(commands::settings::SettingsArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::List => commands::chains::list(&global),
        Commands::Show(args) => commands::chains::show(&global, args),
        Commands::Add(args) => commands::chains::add(&global, args),
        Commands::Remove(args) => commands::chains::remove(&global, args),
        Commands::Rename(args) => commands::chains::rename(&global, args),
        Commands::Insert(args) => commands::edit::insert(&global, args),
        Commands::Clear(args) => commands::edit::clear(&global, args),
        Commands::Move(args) => commands::edit::move_slot(&global, args),
        Commands::Bypass(args) => commands::edit::bypass(&global, args),
        Commands::Set(args) => commands::edit::set(&global, args),
        Commands::Volume(args) => commands::edit::volume(&global, args),
        Commands::Open(args) => commands::edit::open(&global, args),
        Commands::Render(args) => commands::render::run(&global, args),
        Commands::Export(args) => commands::export::run(&global, args),
        Commands::Effects(args) => commands::effects::run(args),
        Commands::Settings(args) => commands::settings::run(&global, args),
    }
}
