//! YouTube search through yt-dlp's `ytsearch` extractor

use crate::error::SearchError;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Free-text video search returning the single best result, if any.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn top_result(&self, query: &str) -> Result<Option<SearchHit>, SearchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
}

#[derive(Debug)]
pub struct YtDlpSearch {
    yt_dlp_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    entries: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl YtDlpSearch {
    pub fn new(yt_dlp_path: PathBuf) -> Self {
        Self { yt_dlp_path }
    }
}

#[async_trait]
impl VideoSearch for YtDlpSearch {
    async fn top_result(&self, query: &str) -> Result<Option<SearchHit>, SearchError> {
        debug!("Searching: {}", query);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                // List results without resolving each video
                "--flat-playlist",
                "--dump-single-json",
                "--no-warnings",
            ])
            .arg(format!("ytsearch1:{}", query))
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SearchError::YtDlpNotFound,
                _ => SearchError::Io(e),
            })?;

        if !output.status.success() {
            debug!("yt-dlp stderr: {}", String::from_utf8_lossy(&output.stderr));
            return Err(SearchError::YtDlpFailed(output.status.code()));
        }

        parse_search_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_search_output(stdout: &str) -> Result<Option<SearchHit>, SearchError> {
    let results: SearchResults =
        serde_json::from_str(stdout).map_err(|e| SearchError::Parse(e.to_string()))?;

    Ok(results.entries.into_iter().next().map(|entry| SearchHit {
        url: entry
            .url
            .filter(|u| u.starts_with("http"))
            .unwrap_or_else(|| watch_url(&entry.id)),
        title: entry.title.unwrap_or_else(|| entry.id.clone()),
    }))
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
