use anyhow::{Context, Result};
use spotaudio_core::{
    config::Config,
    pipeline::INVALID_URL,
    playlist::extract_playlist_id,
    spotify::{PlaylistSource, SpotifyClient},
};

pub async fn run(url: &str, config: &Config) -> Result<()> {
    let playlist_id = extract_playlist_id(url).context(INVALID_URL)?;
    let (client_id, client_secret) = config.credentials()?;

    let client = SpotifyClient::new(&config.spotify, client_id, client_secret);
    let tracks = client
        .playlist_tracks(&playlist_id)
        .await
        .context("Error retrieving playlist information")?;

    println!("Playlist {} ({} tracks)\n", playlist_id, tracks.len());
    for (i, track) in tracks.iter().enumerate() {
        println!("{:>4}. {}", i + 1, track);
        println!("      query: {}", track.search_query(&config.search.query_suffix));
    }

    Ok(())
}
