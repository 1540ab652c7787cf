//! # Spotify Integration Module
//!
//! This module is the integration layer between spotisort and the Spotify
//! Web API. It owns all HTTP communication: the OAuth 2.0 PKCE flow,
//! resilient paginated collection retrieval, and the playlist mutation
//! endpoints.
//!
//! ## Core Modules
//!
//! - [`auth`] - OAuth 2.0 PKCE flow: verifier/challenge generation, browser
//!   launch, local callback handling and token exchange/refresh.
//! - [`pagination`] - Generic cursor-paginated retrieval with rate-limit
//!   backoff, an enforced retry ceiling and full-diagnostic failures.
//! - [`playlists`] - Saved-track and playlist collection endpoints, playlist
//!   creation/unfollow, and chunked add/remove mutation calls.
//!
//! ## Error Handling Philosophy
//!
//! Only rate limiting (429 plus a `retry-after` header) is handled
//! transparently, by sleeping the signaled duration and retrying the same
//! request. Every other failure carries its diagnostic context upward and
//! terminates the enclosing run; partial reconciliation would leave the
//! managed playlists in a state that is hard to diagnose.
//!
//! ## Concurrency
//!
//! Access is deliberately sequential: at most one request is in flight at
//! any time, and successive page fetches are separated by a fixed delay to
//! minimize rate-limit pressure. All waiting happens at async suspension
//! points.
//!
//! ## API Coverage
//!
//! - `GET /me/tracks` - saved-track library (paginated)
//! - `GET /me/playlists` - user playlists (paginated)
//! - `GET /playlists/{id}/tracks` - playlist track list (paginated)
//! - `POST /users/{user_id}/playlists` - create playlist
//! - `DELETE /playlists/{id}/followers` - unfollow playlist
//! - `POST /playlists/{id}/tracks` - add tracks (max 100 per call)
//! - `DELETE /playlists/{id}/tracks` - remove tracks (max 100 per call)
//! - `POST /api/token` - token exchange and refresh

pub mod auth;
pub mod pagination;
pub mod playlists;
