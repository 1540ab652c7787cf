use std::collections::HashSet;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::{Track, TrackItem};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Derives the year-bucket label for an album release date.
///
/// Release years 2018 and later get their own playlist and map to the
/// literal year string. Earlier years are grouped by decade: the first three
/// characters of the year followed by `0s`, so "1987" maps to "1980s" and
/// "2015" to "2010s". The label is a pure function of the release date and
/// independent of fetch order.
///
/// Returns `None` when the date does not start with a four-digit year.
pub fn year_bucket(release_date: &str) -> Option<String> {
    let year = release_date.split('-').next().unwrap_or_default();
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    if year.parse::<u32>().ok()? >= 2018 {
        Some(year.to_string())
    } else {
        Some(format!("{}0s", &year[..3]))
    }
}

/// Returns true when a playlist name looks like a year-bucket label.
///
/// Both exact years ("2019") and decade labels ("1980s") contain four
/// consecutive digits, so that is the test. Playlists matching it are
/// excluded from the playlisted union used by the unplaylisted pass.
pub fn is_year_bucket_name(name: &str) -> bool {
    name.as_bytes()
        .windows(4)
        .any(|w| w.iter().all(u8::is_ascii_digit))
}

/// Returns true when `items` contains a track with the given ID.
pub fn contains_track(items: &[TrackItem], track_id: &str) -> bool {
    items.iter().any(|item| item.track.id == track_id)
}

fn id_set(items: &[TrackItem]) -> HashSet<&str> {
    items.iter().map(|item| item.track.id.as_str()).collect()
}

/// Computes the catch-all playlist diff from snapshots.
///
/// Returns `(additions, removals)` for the catch-all playlist: additions are
/// saved tracks that appear neither in the playlisted union nor in the
/// catch-all itself; removals are catch-all tracks that have since been filed
/// into another playlist. All three inputs are snapshots taken before any
/// mutation is issued.
pub fn unplaylisted_diff(
    saved: &[TrackItem],
    playlisted: &[TrackItem],
    tracked: &[TrackItem],
) -> (Vec<Track>, Vec<Track>) {
    let playlisted_ids = id_set(playlisted);
    let tracked_ids = id_set(tracked);

    let additions = saved
        .iter()
        .filter(|item| {
            !playlisted_ids.contains(item.track.id.as_str())
                && !tracked_ids.contains(item.track.id.as_str())
        })
        .map(|item| item.track.clone())
        .collect();

    let removals = tracked
        .iter()
        .filter(|item| playlisted_ids.contains(item.track.id.as_str()))
        .map(|item| item.track.clone())
        .collect();

    (additions, removals)
}

/// Computes the flagged-playlist removals: tracks in the review playlist
/// that are confirmed present in the saved library.
pub fn flagged_removals(flagged: &[TrackItem], saved: &[TrackItem]) -> Vec<Track> {
    let saved_ids = id_set(saved);

    flagged
        .iter()
        .filter(|item| saved_ids.contains(item.track.id.as_str()))
        .map(|item| item.track.clone())
        .collect()
}
