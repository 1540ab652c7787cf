use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use spotisort::management::{CacheBackend, CacheStore, FileCache, TokenManager, bucket_cache_key};

fn temp_cache_root(test_name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "spotisort-cache-test-{}-{}",
        std::process::id(),
        test_name
    ))
}

fn store(test_name: &str) -> (CacheStore<FileCache>, PathBuf) {
    let root = temp_cache_root(test_name);
    let _ = std::fs::remove_dir_all(&root);
    (
        CacheStore::with_backend(FileCache::with_root(root.clone())),
        root,
    )
}

#[tokio::test]
async fn test_get_or_load_round_trip() {
    let (cache, root) = store("round-trip");
    let calls = Arc::new(AtomicUsize::new(0));

    // first call misses and invokes the loader exactly once
    let counter = Arc::clone(&calls);
    let loaded: Vec<String> = cache
        .get_or_load("tracks", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["a".to_string(), "b".to_string()])
        })
        .await
        .unwrap();
    assert_eq!(loaded, vec!["a", "b"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // the result is persisted as one JSON file per key
    assert!(root.join("tracks.json").is_file());

    // second call is served from the cache without invoking the loader
    let counter = Arc::clone(&calls);
    let cached: Vec<String> = cache
        .get_or_load("tracks", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["other".to_string()])
        })
        .await
        .unwrap();
    assert_eq!(cached, vec!["a", "b"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_invalidate_forces_reload() {
    let (cache, root) = store("invalidate");
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let counter = Arc::clone(&calls);
        let _: Vec<String> = cache
            .get_or_load("playlists", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["x".to_string()])
            })
            .await
            .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    cache.invalidate("playlists").await.unwrap();

    // after invalidation the next get_or_load must hit the loader again
    let counter = Arc::clone(&calls);
    let _: Vec<String> = cache
        .get_or_load("playlists", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["x".to_string()])
        })
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_invalidate_absent_entry_is_a_noop() {
    let (cache, root) = store("invalidate-noop");

    assert!(cache.invalidate("never-written").await.is_ok());

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_empty_snapshot_is_not_trusted() {
    let (cache, root) = store("empty-snapshot");
    let calls = Arc::new(AtomicUsize::new(0));

    // a loader returning an empty collection is persisted but not trusted
    for _ in 0..2 {
        let counter = Arc::clone(&calls);
        let loaded: Vec<String> = cache
            .get_or_load("empty", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await
            .unwrap();
        assert!(loaded.is_empty());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_malformed_payload_is_treated_as_miss() {
    let root = temp_cache_root("malformed");
    let _ = std::fs::remove_dir_all(&root);
    let backend = FileCache::with_root(root.clone());
    backend
        .put("broken", "{not valid json".to_string())
        .await
        .unwrap();

    let cache = CacheStore::with_backend(backend);
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let loaded: Vec<String> = cache
        .get_or_load("broken", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["fresh".to_string()])
        })
        .await
        .unwrap();
    assert_eq!(loaded, vec!["fresh"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_clear_empties_every_entry() {
    let (cache, root) = store("clear");

    let _: Vec<String> = cache
        .get_or_load("one", || async { Ok(vec!["1".to_string()]) })
        .await
        .unwrap();
    let _: Vec<String> = cache
        .get_or_load("two", || async { Ok(vec!["2".to_string()]) })
        .await
        .unwrap();

    cache.clear().await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let _: Vec<String> = cache
        .get_or_load("one", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["1".to_string()])
        })
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_clear_leaves_the_persisted_token_alone() {
    // the token lives next to the cache directory, not inside it
    let mut token_path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    token_path.push("spotisort/token.json");
    std::fs::create_dir_all(token_path.parent().unwrap()).unwrap();
    let token = serde_json::json!({
        "access_token": "access",
        "refresh_token": "refresh",
        "scope": "user-library-read",
        "expires_in": 3600u64,
        "obtained_at": 0u64,
    });
    std::fs::write(&token_path, token.to_string()).unwrap();

    // emptying the default cache must not delete the credential
    CacheStore::new().clear().await.unwrap();

    assert!(token_path.is_file());
    assert!(TokenManager::load().await.is_ok());
}

#[test]
fn test_bucket_cache_key_is_derived_from_label() {
    assert_eq!(bucket_cache_key("2019"), "bucket_2019");
    assert_eq!(bucket_cache_key("1980s"), "bucket_1980s");
    assert_ne!(bucket_cache_key("2019"), bucket_cache_key("2010s"));
}
