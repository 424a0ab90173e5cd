//! Playlist identifiers, track references and video matches

use regex::Regex;
use std::fmt;

/// One playlist entry, reduced to what the search needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub artist: String,
    pub title: String,
}

impl TrackRef {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Free-text query sent to the video search, e.g. "Artist Title lyrics video"
    pub fn search_query(&self, suffix: &str) -> String {
        let suffix = suffix.trim();
        if suffix.is_empty() {
            format!("{} {}", self.artist, self.title)
        } else {
            format!("{} {} {}", self.artist, self.title, suffix)
        }
    }

    /// "Artist - Title", used as the output file stem
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Search result standing in for a track. The match is best-effort and unverified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMatch {
    pub url: String,
    /// Name the downloaded file is saved under (without extension)
    pub title: String,
    /// Title of the video as reported by the search
    pub video_title: Option<String>,
}

/// Extract the playlist id from a share URL such as
/// `https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=...`
pub fn extract_playlist_id(url: &str) -> Option<String> {
    let re = Regex::new(r"playlist/(\w+)").ok()?;
    let caps = re.captures(url)?;
    Some(caps.get(1)?.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_playlist_id() {
        assert_eq!(
            extract_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            Some("37i9dQZF1DXcBWIGoYBM5M".to_string())
        );
        assert_eq!(
            extract_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=a1b2c3"),
            Some("37i9dQZF1DXcBWIGoYBM5M".to_string())
        );
        assert_eq!(
            extract_playlist_id("open.spotify.com/user/someone/playlist/abc_123/"),
            Some("abc_123".to_string())
        );
    }

    #[test]
    fn test_extract_playlist_id_rejects_other_urls() {
        assert_eq!(extract_playlist_id("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy"), None);
        assert_eq!(extract_playlist_id("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M"), None);
        assert_eq!(extract_playlist_id("https://open.spotify.com/playlist/"), None);
        assert_eq!(extract_playlist_id(""), None);
    }

    #[test]
    fn test_search_query() {
        let track = TrackRef::new("Daft Punk", "One More Time");
        assert_eq!(
            track.search_query("lyrics video"),
            "Daft Punk One More Time lyrics video"
        );
        assert_eq!(track.search_query(""), "Daft Punk One More Time");
        assert_eq!(track.display_title(), "Daft Punk - One More Time");
    }
}
