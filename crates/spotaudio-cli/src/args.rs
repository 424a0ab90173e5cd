use clap::{Parser, Subcommand, ValueEnum};
use spotaudio_core::downloader::AudioFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spotaudio")]
#[command(author, version, about = "Download a Spotify playlist as local audio files")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Spotify playlist URL (shorthand for `convert <URL>`)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    #[command(flatten)]
    pub options: ConvertOptions,

    /// Spotify client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID", global = true, hide_env_values = true)]
    pub client_id: Option<String>,

    /// Spotify client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every track of a playlist
    Convert {
        /// Spotify playlist URL
        url: String,
    },

    /// List the tracks of a playlist
    Tracks {
        /// Spotify playlist URL
        url: String,
    },

    /// Check external tools and credentials
    Doctor,

    /// Show configuration
    Config {
        /// Write a default config file to the user config directory
        #[arg(long)]
        init: bool,
    },
}

#[derive(clap::Args, Clone)]
pub struct ConvertOptions {
    /// Output directory
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Audio format (defaults to the configured format)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Only search for matches, download nothing
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// MP3 - Lossy, widely compatible
    Mp3,
    /// M4A (AAC) - Lossy, good quality/size ratio
    M4a,
    /// Opus - Lossy, best quality/size ratio
    Opus,
    /// FLAC - Lossless container (no quality gain over the source)
    Flac,
    /// WAV - Uncompressed PCM
    Wav,
    /// Keep the downloaded stream untouched (no FFmpeg needed)
    Best,
}

impl From<OutputFormat> for AudioFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Mp3 => AudioFormat::Mp3,
            OutputFormat::M4a => AudioFormat::M4a,
            OutputFormat::Opus => AudioFormat::Opus,
            OutputFormat::Flac => AudioFormat::Flac,
            OutputFormat::Wav => AudioFormat::Wav,
            OutputFormat::Best => AudioFormat::Best,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_url_shorthand() {
        let cli = Cli::parse_from([
            "spotaudio",
            "https://open.spotify.com/playlist/abc",
            "-o",
            "music",
            "-f",
            "opus",
        ]);
        assert!(cli.command.is_none());
        assert_eq!(cli.url.as_deref(), Some("https://open.spotify.com/playlist/abc"));
        assert_eq!(cli.options.output, Some(PathBuf::from("music")));
        assert_eq!(cli.options.format, Some(OutputFormat::Opus));
    }

    #[test]
    fn test_convert_subcommand() {
        let cli = Cli::parse_from([
            "spotaudio",
            "convert",
            "https://open.spotify.com/playlist/abc",
            "--dry-run",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.options.dry_run);
        assert!(cli.options.format.is_none());
        match cli.command {
            Some(Commands::Convert { url }) => {
                assert_eq!(url, "https://open.spotify.com/playlist/abc");
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_options_before_subcommand() {
        let cli = Cli::parse_from([
            "spotaudio",
            "-o",
            "music",
            "convert",
            "https://open.spotify.com/playlist/abc",
            "-f",
            "best",
        ]);
        assert!(matches!(cli.command, Some(Commands::Convert { .. })));
        assert_eq!(cli.options.output, Some(PathBuf::from("music")));
        assert_eq!(cli.options.format, Some(OutputFormat::Best));
    }
}
