use std::fmt;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

/// One page of a cursor-paginated Spotify collection.
///
/// Every paginated endpoint used by the sorter (saved tracks, playlists,
/// playlist tracks) returns this envelope: the items of the current page,
/// the running total of the whole collection and an optional URL of the
/// next page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub album: TrackAlbum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAlbum {
    pub release_date: String,
}

/// Wrapper around a track as returned by the saved-tracks and
/// playlist-tracks endpoints, both of which nest the track object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackItem {
    pub track: Track,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner: PlaylistOwner,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackUri>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackUri {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

/// Whether a pending mutation adds tracks to or removes tracks from a
/// playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Remove,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Add => write!(f, "add"),
            MutationKind::Remove => write!(f, "remove"),
        }
    }
}

/// A batch of track additions or removals against one playlist, produced by
/// a reconciliation pass and applied in chunks of at most 100 tracks.
#[derive(Debug, Clone)]
pub struct PendingMutation {
    pub kind: MutationKind,
    pub playlist: Playlist,
    pub tracks: Vec<Track>,
}

#[derive(Tabled)]
pub struct SyncTableRow {
    pub pass: String,
    pub additions: usize,
    pub removals: usize,
}
