use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "pawsense", about = "Pet pain assessment from a photo")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a photo for pain assessment
    Assess(commands::assess::AssessArgs),
    /// Inspect or seed the persisted assessment context
    Context(commands::context::ContextArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Assess(args) => commands::assess::run(args).await,
        Commands::Context(args) => commands::context::run(args).await,
    }
}
