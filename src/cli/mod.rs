//! # CLI Module
//!
//! User-facing commands for spotisort.
//!
//! - [`auth`] - Spotify OAuth authentication flow with PKCE security
//! - [`sync`] - Snapshot load plus the three reconciliation passes (year
//!   bucketing, unplaylisted sync, flagged sync), with flags for pre-sync
//!   cache invalidation and pass selection
//!
//! Commands delegate to the management and spotify layers and own all user
//! interaction: progress feedback, the summary table and error presentation.
//! Failures other than rate limiting terminate the run; partial
//! reconciliation would leave the managed playlists in an inconsistent
//! state.

mod auth;
mod sync;

pub use auth::auth;
pub use sync::{plan_year_additions, sync};
