//! Request extractors that guard the `/v1` routes.
//!
//! - [`auth::RequireAdmin`] -- Requires the configured admin bearer token.

pub mod auth;
