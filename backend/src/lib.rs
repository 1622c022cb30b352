//! verso: memoized application version endpoint.
//!
//! Resolves an application's version at most once per process and serves it
//! as JSON on an administrative HTTP listener. This module exposes the admin
//! application builder for use by the binary and by integration tests.

use axum::{routing::get, Json, Router};
use tower_http::trace::TraceLayer;

pub mod bundle;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod memo;
pub mod openapi;
pub mod resolver;
pub mod version;

pub use bundle::VersionBundle;
pub use endpoint::{VersionEndpoint, VersionEndpointBuilder};
pub use error::{BundleError, ResolveError};
pub use memo::{FailurePolicy, MemoizedVersion, ResolutionState};
pub use resolver::{BuildInfoVersion, EnvVersion, FileVersion, StaticVersion, VersionResolver};

/// Paths the admin application serves itself.
pub const RESERVED_PATHS: [&str; 2] = ["/health", "/openapi.json"];

/// Create the admin application router.
///
/// Serves `/health`, `/openapi.json` and the version endpoint of `bundle`.
/// Fails if the version path collides with one of the built-in routes.
pub fn create_admin_app(bundle: &VersionBundle) -> Result<Router, BundleError> {
    if RESERVED_PATHS.contains(&bundle.url()) {
        return Err(BundleError::InvalidArgument(format!(
            "version path {} is reserved by the admin listener",
            bundle.url()
        )));
    }

    let doc = openapi::api_doc(bundle.url());
    let router = Router::new().route("/health", get(health)).route(
        "/openapi.json",
        get(move || {
            let doc = doc.clone();
            async move { Json(doc) }
        }),
    );

    Ok(bundle
        .register(router)
        .layer(TraceLayer::new_for_http()))
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}
