//! Spotify Web API client (client-credentials flow)

use crate::config::SpotifyConfig;
use crate::error::SpotifyError;
use crate::playlist::TrackRef;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{header, Client, Response};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Spotify caps playlist item pages at 100.
const PAGE_LIMIT: &str = "100";
const TRACK_FIELDS: &str = "next,items(track(type,name,artists(name)))";

/// Anything that can list the tracks of a playlist, in playlist order.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<TrackRef>, SpotifyError>;
}

#[derive(Debug)]
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    api_url: String,
    accounts_url: String,
    token: Mutex<Option<AccessToken>>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        // Renew a minute early so a token never expires mid-pagination
        now + Duration::seconds(60) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    track: Option<PlaylistTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrack {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    #[serde(default)]
    name: Option<String>,
}

impl PlaylistPage {
    /// Track references on this page. Removed entries, episodes and
    /// tracks without a name or artist are dropped.
    pub(crate) fn track_refs(&self) -> Vec<TrackRef> {
        self.items
            .iter()
            .filter_map(|item| item.track.as_ref())
            .filter(|track| track.kind.as_deref() != Some("episode"))
            .filter_map(|track| {
                let title = track.name.as_deref()?.trim();
                let artist = track.artists.first()?.name.as_deref()?.trim();
                if title.is_empty() || artist.is_empty() {
                    return None;
                }
                Some(TrackRef::new(artist, title))
            })
            .collect()
    }
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig, client_id: String, client_secret: String) -> Self {
        Self {
            http: Client::new(),
            client_id,
            client_secret,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            accounts_url: config.accounts_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, SpotifyError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting client-credentials token");
        let res = self
            .http
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SpotifyError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        let value = token.access_token.clone();
        *cached = Some(AccessToken {
            value: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });
        Ok(value)
    }

    async fn fetch_page(
        &self,
        url: &str,
        playlist_id: &str,
        first: bool,
    ) -> Result<PlaylistPage, SpotifyError> {
        let token = self.access_token().await?;
        let mut request = self.http.get(url).bearer_auth(token);
        if first {
            request = request.query(&[("limit", PAGE_LIMIT), ("fields", TRACK_FIELDS)]);
        }

        let res = request.send().await?;
        let res = check_status(res, playlist_id).await?;

        res.json::<PlaylistPage>()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))
    }
}

async fn check_status(res: Response, playlist_id: &str) -> Result<Response, SpotifyError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let retry_after = res
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());

    let err = SpotifyError::from_status(status.as_u16(), playlist_id, retry_after);
    if let SpotifyError::Auth { status, .. } = err {
        let body = res.text().await.unwrap_or_default();
        return Err(SpotifyError::Auth { status, body });
    }
    Err(err)
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<TrackRef>, SpotifyError> {
        info!("Fetching playlist {}", playlist_id);

        let mut url = format!("{}/playlists/{}/tracks", self.api_url, playlist_id);
        let mut first = true;
        let mut tracks = Vec::new();

        loop {
            let page = self.fetch_page(&url, playlist_id, first).await?;
            let refs = page.track_refs();
            if refs.len() < page.items.len() {
                warn!(
                    "Skipped {} playlist entries without a usable track",
                    page.items.len() - refs.len()
                );
            }
            tracks.extend(refs);

            match page.next {
                Some(next) => {
                    url = next;
                    first = false;
                }
                None => break,
            }
        }

        debug!("Playlist {} has {} tracks", playlist_id, tracks.len());
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_track_refs() {
        let json = r#"{
            "items": [
                {"track": {"type": "track", "name": "Around the World", "artists": [{"name": "Daft Punk"}, {"name": "Someone"}]}},
                {"track": null},
                {"track": {"type": "episode", "name": "Podcast #12", "artists": []}},
                {"track": {"type": "track", "name": "Teardrop", "artists": [{"name": "Massive Attack"}]}},
                {"track": {"type": "track", "name": "", "artists": [{"name": "Nobody"}]}}
            ],
            "next": "https://api.spotify.com/v1/playlists/abc/tracks?offset=100&limit=100"
        }"#;

        let page: PlaylistPage = serde_json::from_str(json).unwrap();
        assert_eq!(
            page.track_refs(),
            vec![
                TrackRef::new("Daft Punk", "Around the World"),
                TrackRef::new("Massive Attack", "Teardrop"),
            ]
        );
        assert!(page.next.is_some());
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page: PlaylistPage = serde_json::from_str(r#"{"items": [], "next": null}"#).unwrap();
        assert!(page.track_refs().is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_token_freshness() {
        let now = Utc::now();
        let token = AccessToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(3600),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(3550)));
    }

    mod mock_api {
        use super::*;
        use axum::{
            extract::{Path, Query, State},
            http::{header, HeaderMap, StatusCode},
            response::{IntoResponse, Response as MockResponse},
            routing::{get, post},
            Json, Router,
        };
        use serde_json::json;
        use std::collections::HashMap;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        // base64("id:secret")
        const GOOD_BASIC: &str = "Basic aWQ6c2VjcmV0";

        #[derive(Clone)]
        struct MockSpotify {
            base: String,
            token_requests: Arc<AtomicUsize>,
        }

        fn auth_header(headers: &HeaderMap) -> Option<&str> {
            headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
        }

        fn track(artist: &str, name: &str) -> serde_json::Value {
            json!({"track": {"type": "track", "name": name, "artists": [{"name": artist}]}})
        }

        async fn token(State(mock): State<MockSpotify>, headers: HeaderMap) -> MockResponse {
            mock.token_requests.fetch_add(1, Ordering::SeqCst);
            if auth_header(&headers) != Some(GOOD_BASIC) {
                return (StatusCode::BAD_REQUEST, r#"{"error":"invalid_client"}"#).into_response();
            }
            Json(json!({"access_token": "test-token", "token_type": "Bearer", "expires_in": 3600}))
                .into_response()
        }

        async fn tracks(
            State(mock): State<MockSpotify>,
            Path(id): Path<String>,
            Query(query): Query<HashMap<String, String>>,
            headers: HeaderMap,
        ) -> MockResponse {
            if auth_header(&headers) != Some("Bearer test-token") {
                return StatusCode::UNAUTHORIZED.into_response();
            }

            match id.as_str() {
                "missing" => StatusCode::NOT_FOUND.into_response(),
                "busy" => (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "3")]).into_response(),
                _ => match query.get("offset") {
                    None => {
                        if query.get("limit").map(String::as_str) != Some(PAGE_LIMIT) {
                            return StatusCode::BAD_REQUEST.into_response();
                        }
                        Json(json!({
                            "items": [track("Daft Punk", "One More Time"), {"track": null}, track("Massive Attack", "Teardrop")],
                            "next": format!("{}/v1/playlists/{}/tracks?offset=3", mock.base, id),
                        }))
                        .into_response()
                    }
                    Some(_) => Json(json!({
                        "items": [track("Portishead", "Roads")],
                        "next": null,
                    }))
                    .into_response(),
                },
            }
        }

        async fn serve_mock(client_secret: &str) -> (SpotifyClient, Arc<AtomicUsize>) {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let token_requests = Arc::new(AtomicUsize::new(0));

            let app = Router::new()
                .route("/api/token", post(token))
                .route("/v1/playlists/{id}/tracks", get(tracks))
                .with_state(MockSpotify {
                    base: base.clone(),
                    token_requests: token_requests.clone(),
                });
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let config = SpotifyConfig {
                client_id: None,
                client_secret: None,
                api_url: format!("{}/v1/", base),
                accounts_url: base,
            };
            let mut client = SpotifyClient::new(&config, "id".to_string(), client_secret.to_string());
            // Ignore any proxy configured in the environment
            client.http = Client::builder().no_proxy().build().unwrap();
            (client, token_requests)
        }

        #[tokio::test]
        async fn test_pages_joined_with_one_token() {
            let (client, token_requests) = serve_mock("secret").await;

            let tracks = client.playlist_tracks("abc").await.unwrap();
            assert_eq!(
                tracks,
                vec![
                    TrackRef::new("Daft Punk", "One More Time"),
                    TrackRef::new("Massive Attack", "Teardrop"),
                    TrackRef::new("Portishead", "Roads"),
                ]
            );
            assert_eq!(token_requests.load(Ordering::SeqCst), 1);

            client.playlist_tracks("abc").await.unwrap();
            assert_eq!(token_requests.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_not_found() {
            let (client, _) = serve_mock("secret").await;
            let err = client.playlist_tracks("missing").await.unwrap_err();
            assert!(matches!(err, SpotifyError::NotFound(id) if id == "missing"));
        }

        #[tokio::test]
        async fn test_rate_limited_reads_retry_after() {
            let (client, _) = serve_mock("secret").await;
            let err = client.playlist_tracks("busy").await.unwrap_err();
            assert!(matches!(err, SpotifyError::RateLimited(Some(3))));
        }

        #[tokio::test]
        async fn test_rejected_credentials() {
            let (client, token_requests) = serve_mock("wrong").await;
            let err = client.playlist_tracks("abc").await.unwrap_err();
            assert!(matches!(
                err,
                SpotifyError::Auth { status: 400, ref body } if body.contains("invalid_client")
            ));
            assert_eq!(token_requests.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_token_response_default_expiry() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token": "abc", "token_type": "Bearer"}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 3600);
    }
}
