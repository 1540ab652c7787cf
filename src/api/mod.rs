//! # API Module
//!
//! HTTP endpoints for the local callback server that backs the OAuth flow.
//!
//! - [`callback`] - Handles the OAuth callback from Spotify's authorization
//!   server and completes the PKCE token exchange.
//! - [`health`] - Health check returning application status and version.
//!
//! The endpoints are plain async handlers wired into an [`axum`] router by
//! [`crate::server::start_api_server`]. The server only lives for the
//! duration of the `auth` command; the sync commands never start it.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
