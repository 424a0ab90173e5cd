//! Audio-only downloads using yt-dlp

use crate::error::DownloadError;
use crate::playlist::VideoMatch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::process::Command;
use tracing::{debug, info};

/// Fetches the audio of a matched video into a directory.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Returns the path of the written file.
    async fn fetch(&self, video: &VideoMatch, output_dir: &Path) -> Result<PathBuf, DownloadError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    M4a,
    Opus,
    Flac,
    Wav,
    /// Keep the downloaded stream as-is (no FFmpeg required)
    Best,
}

impl AudioFormat {
    /// Extension yt-dlp writes for this format, `None` when it depends on the stream.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            AudioFormat::Mp3 => Some("mp3"),
            AudioFormat::M4a => Some("m4a"),
            AudioFormat::Opus => Some("opus"),
            AudioFormat::Flac => Some("flac"),
            AudioFormat::Wav => Some("wav"),
            AudioFormat::Best => None,
        }
    }

    /// Whether producing this format needs FFmpeg
    pub fn needs_ffmpeg(&self) -> bool {
        !matches!(self, AudioFormat::Best)
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "m4a" | "aac" => Ok(AudioFormat::M4a),
            "opus" => Ok(AudioFormat::Opus),
            "flac" => Ok(AudioFormat::Flac),
            "wav" => Ok(AudioFormat::Wav),
            "best" => Ok(AudioFormat::Best),
            other => Err(format!("unsupported audio format: {}", other)),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFormat::Mp3 => write!(f, "MP3"),
            AudioFormat::M4a => write!(f, "M4A"),
            AudioFormat::Opus => write!(f, "Opus"),
            AudioFormat::Flac => write!(f, "FLAC"),
            AudioFormat::Wav => write!(f, "WAV"),
            AudioFormat::Best => write!(f, "Audio"),
        }
    }
}

/// Extensions a raw best-audio download can end up with
const STREAM_EXTENSIONS: [&str; 6] = ["m4a", "webm", "opus", "mp3", "ogg", "aac"];

#[derive(Debug)]
pub struct YtDlpDownloader {
    yt_dlp_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    format: AudioFormat,
}

impl YtDlpDownloader {
    pub fn new(yt_dlp_path: PathBuf, ffmpeg_path: Option<PathBuf>, format: AudioFormat) -> Self {
        Self {
            yt_dlp_path,
            ffmpeg_path,
            format,
        }
    }

    fn build_args(&self, video: &VideoMatch, output_template: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            // Audio-only stream, never the muxed video
            "-f".into(),
            "bestaudio".into(),
            "--no-playlist".into(),
            "--no-progress".into(),
            "--force-overwrites".into(),
        ];

        if let Some(ext) = self.format.extension() {
            args.push("--extract-audio".to_string());
            args.push("--audio-format".to_string());
            args.push(ext.to_string());
            if let Some(ref ffmpeg) = self.ffmpeg_path {
                args.push("--ffmpeg-location".to_string());
                args.push(ffmpeg.to_string_lossy().into_owned());
            }
        }

        args.push("--print".to_string());
        args.push("after_move:filepath".to_string());
        args.push("-o".to_string());
        args.push(output_template.to_string_lossy().into_owned());
        args.push(video.url.clone());
        args
    }

    fn find_audio_file(&self, output_dir: &Path, stem: &str) -> Option<PathBuf> {
        let candidates: Vec<&str> = match self.format.extension() {
            Some(ext) => vec![ext],
            None => STREAM_EXTENSIONS.to_vec(),
        };

        candidates
            .into_iter()
            .map(|ext| output_dir.join(format!("{}.{}", stem, ext)))
            .find(|path| path.exists())
    }
}

#[async_trait]
impl AudioFetcher for YtDlpDownloader {
    async fn fetch(&self, video: &VideoMatch, output_dir: &Path) -> Result<PathBuf, DownloadError> {
        info!("Downloading audio from: {}", video.url);

        let stem = sanitize_filename(&video.title);
        let output_template = output_dir.join(format!("{}.%(ext)s", escape_template(&stem)));

        let output = Command::new(&self.yt_dlp_path)
            .args(self.build_args(video, &output_template))
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DownloadError::YtDlpNotFound,
                _ => DownloadError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(&stderr, output.status.code(), &video.url));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let printed = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .filter(|path| path.exists());

        let path = printed
            .or_else(|| self.find_audio_file(output_dir, &stem))
            .ok_or_else(|| DownloadError::NoAudioStream(video.url.clone()))?;

        debug!("Saved: {}", path.display());
        Ok(path)
    }
}

/// Map a failed yt-dlp run to an error kind from its stderr
fn classify_failure(stderr: &str, code: Option<i32>, url: &str) -> DownloadError {
    if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        DownloadError::VideoUnavailable(url.to_string())
    } else if stderr.contains("Requested format is not available") {
        DownloadError::NoAudioStream(url.to_string())
    } else {
        DownloadError::YtDlpFailed(code)
    }
}

/// Sanitize filename for filesystem
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .trim_end_matches('.')
        .to_string()
}

/// yt-dlp output templates treat `%` as a field marker.
fn escape_template(stem: &str) -> String {
    stem.replace('%', "%%")
}
