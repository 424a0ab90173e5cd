//! Configuration management for spotaudio

use crate::downloader::AudioFormat;
use crate::error::{ConfigError, SpotifyError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    /// Client id of a Spotify app (client-credentials flow)
    pub client_id: Option<String>,
    /// Client secret of the same app
    pub client_secret: Option<String>,
    /// Web API base URL
    pub api_url: String,
    /// Accounts service base URL, used for token requests
    pub accounts_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Audio format written to disk
    pub format: AudioFormat,
    /// Default output directory
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Appended to "{artist} {title}" when searching
    pub query_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spotify: SpotifyConfig {
                client_id: None,
                client_secret: None,
                api_url: "https://api.spotify.com/v1".to_string(),
                accounts_url: "https://accounts.spotify.com".to_string(),
            },
            paths: PathsConfig {
                yt_dlp: None,
                ffmpeg: None,
            },
            output: OutputConfig {
                format: AudioFormat::Mp3,
                directory: PathBuf::from("."),
            },
            search: SearchConfig {
                query_suffix: "lyrics video".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(config_file)
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Provider stack: defaults, user config file, explicit file, environment.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(default_config) = default_config_path() {
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        // SPOTAUDIO_SPOTIFY__CLIENT_ID -> spotify.client_id
        figment.merge(Env::prefixed("SPOTAUDIO_").split("__"))
    }

    /// Client id and secret, both required and non-empty
    pub fn credentials(&self) -> Result<(String, String), SpotifyError> {
        let id = self.spotify.client_id.as_deref().map(str::trim).unwrap_or_default();
        let secret = self
            .spotify
            .client_secret
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();

        if id.is_empty() || secret.is_empty() {
            return Err(SpotifyError::MissingCredentials);
        }
        Ok((id.to_string(), secret.to_string()))
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.yt_dlp {
            Ok(path.clone())
        } else {
            which::which("yt-dlp")
                .map_err(|_| ConfigError::InvalidValue("yt-dlp not found in PATH".to_string()))
        }
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.ffmpeg {
            Ok(path.clone())
        } else {
            which::which("ffmpeg")
                .map_err(|_| ConfigError::InvalidValue("ffmpeg not found in PATH".to_string()))
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    /// Write the default configuration to `path`, refusing to clobber an existing file.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::InvalidValue(format!(
                "{} already exists",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Config::default().to_toml()?)?;
        Ok(())
    }
}

/// `{config_dir}/spotaudio/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spotaudio/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.format, AudioFormat::Mp3);
        assert_eq!(config.search.query_suffix, "lyrics video");
        assert!(config.spotify.client_id.is_none());
    }

    #[test]
    fn test_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                [spotify]
                client_id = "from-file"

                [output]
                format = "opus"
                "#,
            )?;
            jail.set_env("SPOTAUDIO_SPOTIFY__CLIENT_SECRET", "from-env");

            let config: Config = Config::figment(Some(Path::new("custom.toml"))).extract()?;
            assert_eq!(config.spotify.client_id.as_deref(), Some("from-file"));
            assert_eq!(config.spotify.client_secret.as_deref(), Some("from-env"));
            assert_eq!(config.output.format, AudioFormat::Opus);
            assert_eq!(config.search.query_suffix, "lyrics video");
            Ok(())
        });
    }

    #[test]
    fn test_credentials_required() {
        let mut config = Config::default();
        assert!(matches!(
            config.credentials(),
            Err(SpotifyError::MissingCredentials)
        ));

        config.spotify.client_id = Some("id".to_string());
        config.spotify.client_secret = Some("  ".to_string());
        assert!(config.credentials().is_err());

        config.spotify.client_secret = Some("secret".to_string());
        assert_eq!(
            config.credentials().unwrap(),
            ("id".to_string(), "secret".to_string())
        );
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.spotify.api_url, "https://api.spotify.com/v1");
        assert_eq!(parsed.output.directory, PathBuf::from("."));
    }

    #[test]
    fn test_write_default_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        Config::write_default(&path).unwrap();
        assert!(path.exists());
        assert!(Config::write_default(&path).is_err());
    }
}
