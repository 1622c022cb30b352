//! Shared types for the verso version endpoint.
//!
//! This crate contains the wire types returned by the admin listener so that
//! clients can decode responses without depending on the server crate.

/// Default port for the administrative listener.
pub const DEFAULT_ADMIN_PORT: u16 = 8081;

/// Default URL path the version endpoint is registered on.
pub const DEFAULT_VERSION_PATH: &str = "/version";

pub mod api;

pub use api::{ErrorResponse, VersionResponse};
