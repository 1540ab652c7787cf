mod auth;
mod cache;

pub use auth::TokenManager;
pub use cache::CACHE_FLAGGED_TRACKS;
pub use cache::CACHE_PLAYLISTED_TRACKS;
pub use cache::CACHE_PLAYLISTS;
pub use cache::CACHE_SAVED_TRACKS;
pub use cache::CACHE_UNPLAYLISTED_TRACKS;
pub use cache::CacheBackend;
pub use cache::CacheError;
pub use cache::CacheStore;
pub use cache::FileCache;
pub use cache::bucket_cache_key;
