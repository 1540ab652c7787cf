use std::{collections::HashMap, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    Res, config, error, info,
    management::{
        CACHE_FLAGGED_TRACKS, CACHE_PLAYLISTED_TRACKS, CACHE_PLAYLISTS, CACHE_SAVED_TRACKS,
        CACHE_UNPLAYLISTED_TRACKS, CacheStore, TokenManager, bucket_cache_key,
    },
    spotify::playlists,
    success,
    types::{MutationKind, PendingMutation, Playlist, SyncTableRow, TrackItem},
    utils, warning,
};

/// Snapshot of the remote state one run reconciles against.
///
/// All collections are resolved through the cache store before any mutation
/// is issued, so every pass observes the same consistent state; mutations
/// from earlier passes are not re-observed by later ones.
struct Snapshot {
    playlists: Vec<Playlist>,
    saved: Vec<TrackItem>,
    playlisted: Vec<TrackItem>,
    unplaylisted_playlist: Playlist,
    unplaylisted_tracks: Vec<TrackItem>,
    flagged_playlist: Playlist,
    flagged_tracks: Vec<TrackItem>,
}

/// Runs the library sync: snapshot load followed by up to three
/// reconciliation passes.
///
/// The three pre-sync flags invalidate cache entries before anything is
/// fetched (`fresh` empties the whole cache, `refresh` drops saved tracks
/// and the playlisted union, `categories` drops only the playlisted union).
/// The three pass flags select which passes run; when none is given, all
/// three run.
pub async fn sync(
    refresh: bool,
    categories: bool,
    fresh: bool,
    unplaylisted: bool,
    years: bool,
    flagged: bool,
) {
    let cache = CacheStore::new();

    if fresh {
        if let Err(e) = cache.clear().await {
            error!("Cannot empty cache: {}", e);
        }
    }
    if refresh {
        if let Err(e) = invalidate_all(&cache, &[CACHE_SAVED_TRACKS, CACHE_PLAYLISTED_TRACKS]).await
        {
            error!("Cannot invalidate cache entries: {}", e);
        }
    }
    if categories {
        if let Err(e) = invalidate_all(&cache, &[CACHE_PLAYLISTED_TRACKS]).await {
            error!("Cannot invalidate cache entries: {}", e);
        }
    }

    let mut token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run spotisort auth\n Error: {}",
                e
            );
        }
    };
    let token = token_mgr.get_valid_token().await;

    let snapshot = match load_snapshot(&cache, &token).await {
        Ok(snapshot) => snapshot,
        Err(e) => error!("Sync aborted while loading remote state: {}", e),
    };

    let run_all = !(unplaylisted || years || flagged);
    let mut summary: Vec<SyncTableRow> = Vec::new();

    if run_all || years {
        match year_pass(&cache, &token, &snapshot).await {
            Ok(additions) => summary.push(SyncTableRow {
                pass: "years".to_string(),
                additions,
                removals: 0,
            }),
            Err(e) => error!("Year pass failed: {}", e),
        }
    }

    if run_all || unplaylisted {
        match unplaylisted_pass(&cache, &token, &snapshot).await {
            Ok((additions, removals)) => summary.push(SyncTableRow {
                pass: "unplaylisted".to_string(),
                additions,
                removals,
            }),
            Err(e) => error!("Unplaylisted pass failed: {}", e),
        }
    }

    if run_all || flagged {
        match flagged_pass(&cache, &token, &snapshot).await {
            Ok(removals) => summary.push(SyncTableRow {
                pass: "flagged".to_string(),
                additions: 0,
                removals,
            }),
            Err(e) => error!("Flagged pass failed: {}", e),
        }
    }

    println!("{}", Table::new(summary));
    success!("Library sync complete.");
}

async fn invalidate_all(cache: &CacheStore, keys: &[&str]) -> Res<()> {
    for key in keys {
        cache.invalidate(key).await?;
    }
    Ok(())
}

fn fetch_progress(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg} {percent}%")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

/// Resolves a reserved playlist (catch-all or flagged) by name, creating it
/// when it does not exist yet.
async fn resolve_reserved(
    cache: &CacheStore,
    token: &str,
    playlists: &[Playlist],
    name: &str,
) -> Res<Playlist> {
    if let Some(playlist) = playlists.iter().find(|p| p.name == name) {
        return Ok(playlist.clone());
    }

    info!("Creating playlist {}", name);
    let created = playlists::create(token, name.to_string()).await?;
    cache.invalidate(CACHE_PLAYLISTS).await?;
    Ok(created)
}

async fn load_snapshot(cache: &CacheStore, token: &str) -> Res<Snapshot> {
    let user = config::spotify_user();
    let unplaylisted_name = config::unplaylisted_playlist_name();
    let flagged_name = config::flagged_playlist_name();

    info!("Getting playlists...");
    let playlists: Vec<Playlist> = cache
        .get_or_load(CACHE_PLAYLISTS, || async move {
            let all = playlists::get_playlists(token).await?;
            // only own, non-collaborative playlists take part in reconciliation
            Ok(all
                .into_iter()
                .filter(|p| !p.collaborative && p.owner.id == user)
                .collect())
        })
        .await?;

    info!("Getting saved tracks...");
    let saved: Vec<TrackItem> = cache
        .get_or_load(CACHE_SAVED_TRACKS, || async move {
            let pb = fetch_progress("Fetching saved tracks...");
            let tracks = playlists::get_saved_tracks(token, Some(&pb)).await;
            pb.finish_and_clear();
            Ok(tracks?)
        })
        .await?;

    let unplaylisted_playlist =
        resolve_reserved(cache, token, &playlists, &unplaylisted_name).await?;
    let flagged_playlist = resolve_reserved(cache, token, &playlists, &flagged_name).await?;

    info!("Getting tracked unplaylisted songs...");
    let unplaylisted_ref = &unplaylisted_playlist;
    let unplaylisted_tracks: Vec<TrackItem> = cache
        .get_or_load(CACHE_UNPLAYLISTED_TRACKS, || async move {
            let pb = fetch_progress("Fetching catch-all playlist...");
            let tracks = playlists::get_playlist_tracks(token, unplaylisted_ref, Some(&pb)).await;
            pb.finish_and_clear();
            Ok(tracks?)
        })
        .await?;

    info!("Getting flagged songs...");
    let flagged_ref = &flagged_playlist;
    let flagged_tracks: Vec<TrackItem> = cache
        .get_or_load(CACHE_FLAGGED_TRACKS, || async move {
            let pb = fetch_progress("Fetching flagged playlist...");
            let tracks = playlists::get_playlist_tracks(token, flagged_ref, Some(&pb)).await;
            pb.finish_and_clear();
            Ok(tracks?)
        })
        .await?;

    info!("Getting playlisted songs...");
    let category_playlists: Vec<Playlist> = playlists
        .iter()
        .filter(|p| {
            p.name != unplaylisted_name
                && p.name != flagged_name
                && !utils::is_year_bucket_name(&p.name)
        })
        .cloned()
        .collect();
    let playlisted: Vec<TrackItem> = cache
        .get_or_load(CACHE_PLAYLISTED_TRACKS, || async move {
            let pb = fetch_progress("Fetching category playlists...");
            let total = category_playlists.len();
            let mut all: Vec<TrackItem> = Vec::new();
            for (idx, playlist) in category_playlists.iter().enumerate() {
                pb.set_message(format!(
                    "Fetching tracks of {} ({}/{})",
                    playlist.name,
                    idx + 1,
                    total
                ));
                all.extend(playlists::get_playlist_tracks(token, playlist, None).await?);
            }
            pb.finish_and_clear();
            Ok(all)
        })
        .await?;

    Ok(Snapshot {
        playlists,
        saved,
        playlisted,
        unplaylisted_playlist,
        unplaylisted_tracks,
        flagged_playlist,
        flagged_tracks,
    })
}

/// Scans the saved library and produces the pending year-bucket additions.
///
/// Walks the saved tracks in saved order. Each track's bucket playlist is
/// taken from the snapshot or obtained through `create_playlist` on first
/// use, and the bucket's current track list is resolved through
/// `load_tracks` at most once per run. Tracks already in their bucket are
/// skipped; queued tracks are deduplicated per bucket. Labels in `reserved`
/// never become buckets.
pub async fn plan_year_additions<C, CFut, L, LFut>(
    saved: &[TrackItem],
    playlists: &[Playlist],
    reserved: &[String],
    mut create_playlist: C,
    mut load_tracks: L,
) -> Res<Vec<PendingMutation>>
where
    C: FnMut(String) -> CFut,
    CFut: Future<Output = Res<Playlist>>,
    L: FnMut(Playlist) -> LFut,
    LFut: Future<Output = Res<Vec<TrackItem>>>,
{
    let mut bucket_playlists: HashMap<String, Playlist> = HashMap::new();
    let mut bucket_tracks: HashMap<String, Vec<TrackItem>> = HashMap::new();
    let mut pending: Vec<PendingMutation> = Vec::new();

    for item in saved {
        let Some(label) = utils::year_bucket(&item.track.album.release_date) else {
            warning!(
                "Cannot derive year bucket for track {} (release date '{}')",
                item.track.name,
                item.track.album.release_date
            );
            continue;
        };
        if reserved.contains(&label) {
            continue;
        }

        if !bucket_playlists.contains_key(&label) {
            let playlist = match playlists.iter().find(|p| p.name == label) {
                Some(p) => p.clone(),
                None => create_playlist(label.clone()).await?,
            };
            let tracks = load_tracks(playlist.clone()).await?;

            bucket_playlists.insert(label.clone(), playlist);
            bucket_tracks.insert(label.clone(), tracks);
        }

        if utils::contains_track(&bucket_tracks[&label], &item.track.id) {
            continue;
        }

        match pending.iter_mut().find(|m| m.playlist.name == label) {
            Some(mutation) => {
                if !mutation.tracks.iter().any(|t| t.id == item.track.id) {
                    mutation.tracks.push(item.track.clone());
                }
            }
            None => pending.push(PendingMutation {
                kind: MutationKind::Add,
                playlist: bucket_playlists[&label].clone(),
                tracks: vec![item.track.clone()],
            }),
        }
    }

    Ok(pending)
}

/// Year bucketing pass.
///
/// Plans the additions over the run's snapshot via [`plan_year_additions`],
/// then applies them one bucket at a time; a mutated bucket's cache entry is
/// invalidated first. Newly created bucket playlists invalidate the cached
/// playlist collection.
async fn year_pass(cache: &CacheStore, token: &str, snapshot: &Snapshot) -> Res<usize> {
    info!("Sorting years...");

    let reserved = [
        config::unplaylisted_playlist_name(),
        config::flagged_playlist_name(),
    ];

    let pending = plan_year_additions(
        &snapshot.saved,
        &snapshot.playlists,
        &reserved,
        |label: String| async move {
            info!("Creating playlist {}", label);
            let created = playlists::create(token, label).await?;
            cache.invalidate(CACHE_PLAYLISTS).await?;
            Ok(created)
        },
        |playlist: Playlist| async move {
            let playlist_ref = &playlist;
            cache
                .get_or_load(&bucket_cache_key(&playlist.name), || async move {
                    Ok(playlists::get_playlist_tracks(token, playlist_ref, None).await?)
                })
                .await
        },
    )
    .await?;

    let mut additions = 0;
    for mutation in &pending {
        info!(
            "Adding {} tracks to {}...",
            mutation.tracks.len(),
            mutation.playlist.name
        );
        cache
            .invalidate(&bucket_cache_key(&mutation.playlist.name))
            .await?;
        playlists::apply(token, mutation).await?;
        additions += mutation.tracks.len();
    }

    Ok(additions)
}

/// Unplaylisted sync pass.
///
/// Removes catch-all tracks that have since been filed into a category
/// playlist and adds saved tracks that are in neither the playlisted union
/// nor the catch-all. Both sets come from the run's snapshot; nothing is
/// re-queried mid-pass.
async fn unplaylisted_pass(
    cache: &CacheStore,
    token: &str,
    snapshot: &Snapshot,
) -> Res<(usize, usize)> {
    let (additions, removals) = utils::unplaylisted_diff(
        &snapshot.saved,
        &snapshot.playlisted,
        &snapshot.unplaylisted_tracks,
    );

    info!("Tracks that have been playlisted: {}", removals.len());
    info!("Tracks not in playlists: {}", additions.len());

    if !additions.is_empty() || !removals.is_empty() {
        cache.invalidate(CACHE_UNPLAYLISTED_TRACKS).await?;
    }

    if !removals.is_empty() {
        playlists::apply(
            token,
            &PendingMutation {
                kind: MutationKind::Remove,
                playlist: snapshot.unplaylisted_playlist.clone(),
                tracks: removals.clone(),
            },
        )
        .await?;
    }

    if !additions.is_empty() {
        playlists::apply(
            token,
            &PendingMutation {
                kind: MutationKind::Add,
                playlist: snapshot.unplaylisted_playlist.clone(),
                tracks: additions.clone(),
            },
        )
        .await?;
    }

    Ok((additions.len(), removals.len()))
}

/// Flagged-playlist sync pass.
///
/// A review is complete once the flagged track is confirmed saved, so every
/// flagged track present in the saved library is removed from the flagged
/// playlist.
async fn flagged_pass(cache: &CacheStore, token: &str, snapshot: &Snapshot) -> Res<usize> {
    let removals = utils::flagged_removals(&snapshot.flagged_tracks, &snapshot.saved);

    info!(
        "Tracks to remove from {}: {}",
        snapshot.flagged_playlist.name,
        removals.len()
    );

    if !removals.is_empty() {
        cache.invalidate(CACHE_FLAGGED_TRACKS).await?;
        playlists::apply(
            token,
            &PendingMutation {
                kind: MutationKind::Remove,
                playlist: snapshot.flagged_playlist.clone(),
                tracks: removals.clone(),
            },
        )
        .await?;
    }

    Ok(removals.len())
}
