//! Playlist conversion pipeline
//!
//! Resolves every playlist track to a video, then downloads the audio of each
//! match. Tracks are processed one at a time and each external call is made
//! once. A failure on one track is recorded and the run moves on; only an
//! invalid URL or a failed playlist fetch ends the run early.

use crate::config::Config;
use crate::downloader::{AudioFetcher, AudioFormat, YtDlpDownloader};
use crate::error::SpotAudioError;
use crate::playlist::{extract_playlist_id, TrackRef, VideoMatch};
use crate::search::{VideoSearch, YtDlpSearch};
use crate::spotify::{PlaylistSource, SpotifyClient};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const MISSING_INPUT: &str = "Please fill in both fields.";
pub const INVALID_URL: &str = "Invalid playlist URL.";
pub const NO_FILES: &str = "No valid audio files found.";

/// One run's input
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub playlist_url: String,
    pub output_dir: PathBuf,
    /// Resolve matches only, write nothing
    pub dry_run: bool,
}

/// Progress reported while a run is in flight
#[derive(Debug, Clone)]
pub enum ConversionEvent {
    /// A line for the status area
    Status(String),
    PlaylistLoaded { total: usize },
    Searching { index: usize, total: usize, track: TrackRef },
    Matched { index: usize, video: VideoMatch },
    Downloading { index: usize, total: usize, title: String },
    Saved { index: usize, path: PathBuf },
    Skipped(SkippedTrack),
    Finished(ConversionReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one file was written
    Completed,
    /// Dry run finished
    Resolved,
    /// Ran to the end without writing a file
    NoFiles,
    MissingInput,
    InvalidUrl,
    PlaylistUnavailable,
    OutputDirUnavailable,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed | Outcome::Resolved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SearchFailed(String),
    NoMatch,
    DownloadFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::SearchFailed(e) => write!(f, "search failed: {}", e),
            SkipReason::NoMatch => write!(f, "no search results"),
            SkipReason::DownloadFailed(e) => write!(f, "download failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTrack {
    pub title: String,
    pub reason: SkipReason,
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub outcome: Outcome,
    /// Final status line
    pub status: String,
    pub tracks: usize,
    pub matches: Vec<VideoMatch>,
    pub files: Vec<PathBuf>,
    pub skipped: Vec<SkippedTrack>,
    pub duration: Duration,
}

impl ConversionReport {
    fn new(outcome: Outcome, status: impl Into<String>) -> Self {
        Self {
            outcome,
            status: status.into(),
            tracks: 0,
            matches: Vec::new(),
            files: Vec::new(),
            skipped: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

pub struct Converter {
    source: Box<dyn PlaylistSource>,
    search: Box<dyn VideoSearch>,
    fetcher: Box<dyn AudioFetcher>,
    query_suffix: String,
    format: AudioFormat,
    progress_tx: mpsc::Sender<ConversionEvent>,
}

impl Converter {
    pub fn new(
        source: Box<dyn PlaylistSource>,
        search: Box<dyn VideoSearch>,
        fetcher: Box<dyn AudioFetcher>,
        query_suffix: String,
        format: AudioFormat,
        progress_tx: mpsc::Sender<ConversionEvent>,
    ) -> Self {
        Self {
            source,
            search,
            fetcher,
            query_suffix,
            format,
            progress_tx,
        }
    }

    /// Wire up Spotify, yt-dlp search and yt-dlp downloads from configuration.
    /// FFmpeg is only looked up when the run will transcode downloads.
    pub fn from_config(
        config: &Config,
        dry_run: bool,
        progress_tx: mpsc::Sender<ConversionEvent>,
    ) -> Result<Self, SpotAudioError> {
        let (client_id, client_secret) = config.credentials()?;
        let yt_dlp_path = config.yt_dlp_path()?;
        let ffmpeg_path = if !dry_run && config.output.format.needs_ffmpeg() {
            Some(config.ffmpeg_path()?)
        } else {
            None
        };

        debug!("yt-dlp: {}", yt_dlp_path.display());

        Ok(Self::new(
            Box::new(SpotifyClient::new(&config.spotify, client_id, client_secret)),
            Box::new(YtDlpSearch::new(yt_dlp_path.clone())),
            Box::new(YtDlpDownloader::new(yt_dlp_path, ffmpeg_path, config.output.format)),
            config.search.query_suffix.clone(),
            config.output.format,
            progress_tx,
        ))
    }

    async fn emit(&self, event: ConversionEvent) {
        let _ = self.progress_tx.send(event).await;
    }

    async fn status(&self, message: String) {
        info!("{}", message);
        self.emit(ConversionEvent::Status(message)).await;
    }

    async fn finish(&self, mut report: ConversionReport, start: Instant) -> ConversionReport {
        report.duration = start.elapsed();
        self.status(report.status.clone()).await;
        self.emit(ConversionEvent::Finished(report.clone())).await;
        report
    }

    async fn skip(&self, report: &mut ConversionReport, title: String, reason: SkipReason) {
        warn!("Skipping {}: {}", title, reason);
        let skipped = SkippedTrack { title, reason };
        self.emit(ConversionEvent::Skipped(skipped.clone())).await;
        report.skipped.push(skipped);
    }

    pub async fn run(&self, request: &ConversionRequest) -> ConversionReport {
        let start = Instant::now();

        let playlist_id = match validate_request(request) {
            Ok(id) => id,
            Err((outcome, status)) => {
                return self
                    .finish(ConversionReport::new(outcome, status), start)
                    .await;
            }
        };

        info!("Starting conversion for playlist {}", playlist_id);

        let tracks = match self.source.playlist_tracks(&playlist_id).await {
            Ok(tracks) => tracks,
            Err(e) => {
                let status = format!("Error retrieving playlist information: {}", e);
                return self
                    .finish(ConversionReport::new(Outcome::PlaylistUnavailable, status), start)
                    .await;
            }
        };

        self.emit(ConversionEvent::PlaylistLoaded { total: tracks.len() })
            .await;

        let mut report = ConversionReport::new(Outcome::NoFiles, NO_FILES);
        report.tracks = tracks.len();
        let matches = self.resolve(&tracks, &mut report).await;
        report.matches = matches;

        if request.dry_run {
            report.outcome = Outcome::Resolved;
            report.status = format!("Found {} of {} tracks.", report.matches.len(), tracks.len());
            return self.finish(report, start).await;
        }

        if let Err(e) = tokio::fs::create_dir_all(&request.output_dir).await {
            report.outcome = Outcome::OutputDirUnavailable;
            report.status = format!(
                "Cannot use output folder '{}': {}",
                request.output_dir.display(),
                e
            );
            return self.finish(report, start).await;
        }

        let matches = report.matches.clone();
        let files = self
            .download_all(&matches, &request.output_dir, &mut report)
            .await;
        report.files = files;

        if !report.files.is_empty() {
            report.outcome = Outcome::Completed;
            report.status = completed_status(self.format, &request.output_dir);
        }

        self.finish(report, start).await
    }

    /// Search for every track, in playlist order
    async fn resolve(&self, tracks: &[TrackRef], report: &mut ConversionReport) -> Vec<VideoMatch> {
        let total = tracks.len();
        let mut matches = Vec::with_capacity(total);

        for (i, track) in tracks.iter().enumerate() {
            let index = i + 1;
            self.emit(ConversionEvent::Searching {
                index,
                total,
                track: track.clone(),
            })
            .await;

            let query = track.search_query(&self.query_suffix);
            match self.search.top_result(&query).await {
                Ok(Some(hit)) => {
                    debug!("{} -> {}", track, hit.url);
                    let video = VideoMatch {
                        url: hit.url,
                        title: track.display_title(),
                        video_title: Some(hit.title),
                    };
                    self.emit(ConversionEvent::Matched {
                        index,
                        video: video.clone(),
                    })
                    .await;
                    matches.push(video);
                }
                Ok(None) => {
                    self.skip(report, track.display_title(), SkipReason::NoMatch)
                        .await;
                }
                Err(e) => {
                    self.status(format!("Error searching for video: {}", e)).await;
                    self.skip(report, track.display_title(), SkipReason::SearchFailed(e.to_string()))
                        .await;
                }
            }
        }

        matches
    }

    async fn download_all(
        &self,
        matches: &[VideoMatch],
        output_dir: &Path,
        report: &mut ConversionReport,
    ) -> Vec<PathBuf> {
        let total = matches.len();
        let mut files = Vec::with_capacity(total);

        for (i, video) in matches.iter().enumerate() {
            let index = i + 1;
            self.status(format!("Downloading {}/{}: {}", index, total, video.title))
                .await;
            self.emit(ConversionEvent::Downloading {
                index,
                total,
                title: video.title.clone(),
            })
            .await;

            match self.fetcher.fetch(video, output_dir).await {
                Ok(path) => {
                    self.emit(ConversionEvent::Saved {
                        index,
                        path: path.clone(),
                    })
                    .await;
                    files.push(path);
                }
                Err(e) => {
                    self.skip(report, video.title.clone(), SkipReason::DownloadFailed(e.to_string()))
                        .await;
                }
            }
        }

        files
    }
}

/// Input checks that need no service: both fields filled in and a playlist
/// id present in the URL. Returns the playlist id.
pub fn validate_request(request: &ConversionRequest) -> Result<String, (Outcome, &'static str)> {
    let url = request.playlist_url.trim();

    if url.is_empty() || request.output_dir.as_os_str().is_empty() {
        return Err((Outcome::MissingInput, MISSING_INPUT));
    }

    extract_playlist_id(url).ok_or((Outcome::InvalidUrl, INVALID_URL))
}

fn completed_status(format: AudioFormat, output_dir: &Path) -> String {
    format!(
        "Conversion completed. {} files saved in '{}'.",
        format,
        output_dir.display()
    )
}
