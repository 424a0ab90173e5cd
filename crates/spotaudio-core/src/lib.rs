//! spotaudio-core: Spotify playlist to local audio files via YouTube

pub mod config;
pub mod downloader;
pub mod error;
pub mod pipeline;
pub mod playlist;
pub mod search;
pub mod spotify;

pub use config::Config;
pub use error::{Result, SpotAudioError};
