use clap::Parser;
use tracing_subscriber::EnvFilter;
use ui_prober::cli::commands::{cmd_candidates, cmd_explore, cmd_progress};
use ui_prober::cli::config::{Cli, Commands, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Explore { app, screen } => {
            cmd_explore(&config, app.as_deref(), screen.as_deref())?;
        }
        Commands::Progress { app } => {
            cmd_progress(&config, app.as_deref())?;
        }
        Commands::Candidates { xml, app, screen } => {
            cmd_candidates(&config, &xml, app.as_deref(), screen.as_deref())?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `-v` raises the level from info.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
