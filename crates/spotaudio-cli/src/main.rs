mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "spotaudio=warn",
        1 => "spotaudio=info",
        2 => "spotaudio=debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Some(Commands::Convert { ref url }) => {
            let config = commands::load_config(&cli)?;
            commands::convert::run(url, &cli.options, config).await
        }
        Some(Commands::Tracks { ref url }) => {
            let config = commands::load_config(&cli)?;
            commands::tracks::run(url, &config).await
        }
        Some(Commands::Doctor) => {
            let config = commands::load_config(&cli)?;
            commands::doctor::run(&config).await
        }
        Some(Commands::Config { init }) => commands::config::run(&cli, init).await,
        None => {
            // If URL provided directly, treat as convert command
            if let Some(ref url) = cli.url {
                let config = commands::load_config(&cli)?;
                commands::convert::run(url, &cli.options, config).await
            } else {
                // No URL, print help
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
