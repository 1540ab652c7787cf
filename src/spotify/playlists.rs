use indicatif::ProgressBar;
use reqwest::Client;

use crate::{
    config,
    spotify::pagination::{self, FetchError},
    types::{
        AddTracksRequest, CreatePlaylistRequest, MutationKind, PendingMutation, Playlist,
        RemoveTracksRequest, SnapshotResponse, Track, TrackItem, TrackUri,
    },
};

/// Documented per-call item limit of the playlist add/remove endpoints.
pub const MUTATION_CHUNK_LIMIT: usize = 100;

/// Retrieves all playlists of the authenticated user.
pub async fn get_playlists(token: &str) -> Result<Vec<Playlist>, FetchError> {
    let api_url = format!("{uri}/me/playlists", uri = &config::spotify_apiurl());
    pagination::fetch_all(token, &api_url, None).await
}

/// Retrieves the complete saved-track library of the authenticated user.
pub async fn get_saved_tracks(
    token: &str,
    progress: Option<&ProgressBar>,
) -> Result<Vec<TrackItem>, FetchError> {
    let api_url = format!(
        "{uri}/me/tracks?limit=50",
        uri = &config::spotify_apiurl()
    );
    pagination::fetch_all(token, &api_url, progress).await
}

/// Retrieves the complete track list of one playlist.
pub async fn get_playlist_tracks(
    token: &str,
    playlist: &Playlist,
    progress: Option<&ProgressBar>,
) -> Result<Vec<TrackItem>, FetchError> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist.id
    );
    pagination::fetch_all(token, &api_url, progress).await
}

/// Creates a new private playlist for the configured user.
///
/// The caller is responsible for invalidating the cached playlist collection
/// afterwards, since the snapshot no longer matches the remote state.
pub async fn create(token: &str, name: String) -> Result<Playlist, reqwest::Error> {
    let api_url = format!(
        "{uri}/users/{user}/playlists",
        uri = &config::spotify_apiurl(),
        user = &config::spotify_user()
    );

    let request = CreatePlaylistRequest {
        description: format!("Managed by spotisort: {}", name),
        name,
        public: false,
        collaborative: false,
    };

    let client = Client::new();
    let response = client
        .post(&api_url)
        .bearer_auth(token)
        .json(&request)
        .send()
        .await?
        .error_for_status()?;

    response.json::<Playlist>().await
}

/// Unfollows (deletes) a playlist.
///
/// As with [`create`], the cached playlist collection must be invalidated by
/// the caller afterwards.
pub async fn unfollow(token: &str, playlist: &Playlist) -> Result<(), reqwest::Error> {
    let api_url = format!(
        "{uri}/playlists/{id}/followers",
        uri = &config::spotify_apiurl(),
        id = playlist.id
    );

    let client = Client::new();
    client
        .delete(&api_url)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}

/// Adds up to [`MUTATION_CHUNK_LIMIT`] tracks to a playlist in one call.
pub async fn add_tracks(
    token: &str,
    playlist_id: &str,
    tracks: &[Track],
) -> Result<SnapshotResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let request = AddTracksRequest {
        uris: tracks.iter().map(|t| t.uri.clone()).collect(),
    };

    let client = Client::new();
    let response = client
        .post(&api_url)
        .bearer_auth(token)
        .json(&request)
        .send()
        .await?
        .error_for_status()?;

    response.json::<SnapshotResponse>().await
}

/// Removes up to [`MUTATION_CHUNK_LIMIT`] tracks from a playlist in one call.
pub async fn remove_tracks(
    token: &str,
    playlist_id: &str,
    tracks: &[Track],
) -> Result<SnapshotResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let request = RemoveTracksRequest {
        tracks: tracks
            .iter()
            .map(|t| TrackUri { uri: t.uri.clone() })
            .collect(),
    };

    let client = Client::new();
    let response = client
        .delete(&api_url)
        .bearer_auth(token)
        .json(&request)
        .send()
        .await?
        .error_for_status()?;

    response.json::<SnapshotResponse>().await
}

/// Applies one pending mutation in chunks of at most
/// [`MUTATION_CHUNK_LIMIT`] tracks.
///
/// Chunks are produced by pure slicing, leaving the source list untouched,
/// and issued strictly sequentially. There is no inter-chunk retry: a failed
/// call propagates immediately and the remaining chunks are neither attempted
/// nor rolled back.
pub async fn apply(token: &str, mutation: &PendingMutation) -> Result<(), reqwest::Error> {
    for chunk in mutation.tracks.chunks(MUTATION_CHUNK_LIMIT) {
        match mutation.kind {
            MutationKind::Add => {
                add_tracks(token, &mutation.playlist.id, chunk).await?;
            }
            MutationKind::Remove => {
                remove_tracks(token, &mutation.playlist.id, chunk).await?;
            }
        }
    }

    Ok(())
}
