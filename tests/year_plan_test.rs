use std::sync::{Arc, Mutex};

use spotisort::{
    cli::plan_year_additions,
    types::{MutationKind, Playlist, PlaylistOwner, Track, TrackAlbum, TrackItem},
};

fn create_test_item(id: &str, release_date: &str) -> TrackItem {
    TrackItem {
        track: Track {
            id: id.to_string(),
            name: format!("Track {}", id),
            uri: format!("spotify:track:{}", id),
            album: TrackAlbum {
                release_date: release_date.to_string(),
            },
        },
    }
}

fn create_test_playlist(name: &str) -> Playlist {
    Playlist {
        id: format!("id-{}", name),
        name: name.to_string(),
        owner: PlaylistOwner {
            id: "tester".to_string(),
        },
        collaborative: false,
    }
}

fn reserved_names() -> [String; 2] {
    ["Unplaylisted".to_string(), "👀".to_string()]
}

#[tokio::test]
async fn test_plan_creates_missing_bucket_playlists() {
    // two saved tracks landing in two buckets, neither playlist exists yet
    let saved = vec![
        create_test_item("a", "2019-01-01"),
        create_test_item("b", "1987-06-01"),
    ];

    let created: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let loaded: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let created_log = Arc::clone(&created);
    let loaded_log = Arc::clone(&loaded);

    let pending = plan_year_additions(
        &saved,
        &[],
        &reserved_names(),
        move |label: String| {
            let created_log = Arc::clone(&created_log);
            async move {
                created_log.lock().unwrap().push(label.clone());
                Ok(create_test_playlist(&label))
            }
        },
        move |playlist: Playlist| {
            let loaded_log = Arc::clone(&loaded_log);
            async move {
                loaded_log.lock().unwrap().push(playlist.name.clone());
                Ok(Vec::new())
            }
        },
    )
    .await
    .unwrap();

    // both buckets are created and their track lists resolved, in saved order
    assert_eq!(*created.lock().unwrap(), vec!["2019", "1980s"]);
    assert_eq!(*loaded.lock().unwrap(), vec!["2019", "1980s"]);

    // one pending addition per bucket, each carrying its single track
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].playlist.name, "2019");
    assert_eq!(pending[0].kind, MutationKind::Add);
    let first_ids: Vec<&str> = pending[0].tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(first_ids, vec!["a"]);
    assert_eq!(pending[1].playlist.name, "1980s");
    let second_ids: Vec<&str> = pending[1].tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(second_ids, vec!["b"]);
}

#[tokio::test]
async fn test_plan_resolves_each_bucket_at_most_once() {
    // two tracks share the 2010s bucket; the 2019 bucket already exists and
    // already contains its track
    let saved = vec![
        create_test_item("a", "2015-01-01"),
        create_test_item("b", "2017-05-05"),
        create_test_item("c", "2019-01-01"),
    ];
    let playlists = vec![create_test_playlist("2019")];

    let created: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let loaded: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let created_log = Arc::clone(&created);
    let loaded_log = Arc::clone(&loaded);

    let pending = plan_year_additions(
        &saved,
        &playlists,
        &reserved_names(),
        move |label: String| {
            let created_log = Arc::clone(&created_log);
            async move {
                created_log.lock().unwrap().push(label.clone());
                Ok(create_test_playlist(&label))
            }
        },
        move |playlist: Playlist| {
            let loaded_log = Arc::clone(&loaded_log);
            async move {
                loaded_log.lock().unwrap().push(playlist.name.clone());
                if playlist.name == "2019" {
                    Ok(vec![create_test_item("c", "2019-01-01")])
                } else {
                    Ok(Vec::new())
                }
            }
        },
    )
    .await
    .unwrap();

    // only the missing bucket is created; the shared bucket and the existing
    // one are each resolved exactly once
    assert_eq!(*created.lock().unwrap(), vec!["2010s"]);
    assert_eq!(*loaded.lock().unwrap(), vec!["2010s", "2019"]);

    // the shared bucket collects both tracks; the already-filed track queues
    // nothing
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].playlist.name, "2010s");
    let ids: Vec<&str> = pending[0].tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}
