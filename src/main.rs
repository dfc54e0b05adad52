//! GCG Hub - Entry Point

use clap::Parser;

use gcg_hub::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings();

    // Initiera logging
    let level = cli.log_level().unwrap_or_else(|| settings.tracing_level());
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Startar GCG Hub v{}", env!("CARGO_PKG_VERSION"));

    cli::run(cli)
}
