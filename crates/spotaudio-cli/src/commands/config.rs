use anyhow::{Context, Result};
use spotaudio_core::config::default_config_path;
use spotaudio_core::Config;

use crate::args::Cli;

pub async fn run(cli: &Cli, init: bool) -> Result<()> {
    if init {
        let path = default_config_path().context("Could not determine config directory")?;
        Config::write_default(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = super::load_config(cli)?;

    // Never echo the secret itself
    if config.spotify.client_secret.is_some() {
        config.spotify.client_secret = Some("********".to_string());
    }

    println!("spotaudio configuration\n");
    println!("{}", config.to_toml()?);

    if config.paths.yt_dlp.is_none() {
        println!("# paths.yt_dlp: (auto-detect)");
    }
    if config.paths.ffmpeg.is_none() {
        println!("# paths.ffmpeg: (auto-detect)");
    }
    if config.spotify.client_id.is_none() {
        println!("# spotify.client_id: (not set)");
    }

    // Show config file locations
    println!("\nConfig sources (lowest to highest priority):");
    if let Some(path) = default_config_path() {
        println!("  1. {}", path.display());
    }
    if let Some(ref p) = cli.config {
        println!("  2. {} (specified)", p.display());
    }
    println!("  3. Environment variables (SPOTAUDIO_*, nested keys split on __)");
    println!("  4. --client-id / --client-secret (or SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET)");

    Ok(())
}
