//! Error types for spotaudio-core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpotAudioError>;

#[derive(Error, Debug)]
pub enum SpotAudioError {
    #[error("Spotify request failed: {0}")]
    Spotify(#[from] SpotifyError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SpotifyError {
    #[error("Spotify credentials missing. Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET")]
    MissingCredentials,

    #[error("authentication rejected ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("rate limited, retry after {0:?} seconds")]
    RateLimited(Option<u64>),

    #[error("playlist not found: {0}")]
    NotFound(String),

    #[error("Spotify API returned status {0}")]
    Api(u16),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("yt-dlp not found. Install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("yt-dlp search failed with exit code: {0:?}")]
    YtDlpFailed(Option<i32>),

    #[error("Failed to parse search results: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("yt-dlp not found. Install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("yt-dlp failed with exit code: {0:?}")]
    YtDlpFailed(Option<i32>),

    #[error("Video unavailable or private: {0}")]
    VideoUnavailable(String),

    #[error("No audio stream available for {0}")]
    NoAudioStream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpotifyError {
    /// Map a non-success HTTP status from the Web API to an error kind.
    pub fn from_status(status: u16, playlist_id: &str, retry_after: Option<u64>) -> Self {
        match status {
            401 | 403 => SpotifyError::Auth {
                status,
                body: String::new(),
            },
            404 => SpotifyError::NotFound(playlist_id.to_string()),
            429 => SpotifyError::RateLimited(retry_after),
            other => SpotifyError::Api(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            SpotifyError::from_status(404, "abc", None),
            SpotifyError::NotFound(id) if id == "abc"
        ));
        assert!(matches!(
            SpotifyError::from_status(429, "abc", Some(3)),
            SpotifyError::RateLimited(Some(3))
        ));
        assert!(matches!(
            SpotifyError::from_status(401, "abc", None),
            SpotifyError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            SpotifyError::from_status(502, "abc", None),
            SpotifyError::Api(502)
        ));
    }
}
