pub mod config;
pub mod convert;
pub mod doctor;
pub mod tracks;

use anyhow::Result;
use spotaudio_core::Config;

use crate::args::Cli;

/// Configuration with command-line overrides applied
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(ref id) = cli.client_id {
        config.spotify.client_id = Some(id.clone());
    }
    if let Some(ref secret) = cli.client_secret {
        config.spotify.client_secret = Some(secret.clone());
    }

    if let Some(format) = cli.options.format {
        config.output.format = format.into();
    }
    if let Some(ref output) = cli.options.output {
        config.output.directory = output.clone();
    }

    Ok(config)
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
