//! The version endpoint.
//!
//! [`VersionEndpoint`] answers `GET` requests on its configured path with the
//! application version, resolving it lazily on the first request and serving
//! the memoized outcome afterwards. Any other method is rejected with `405`
//! without touching the resolver.

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use std::sync::Arc;
use tracing::{debug, warn};
use verso_types::{ErrorResponse, VersionResponse, DEFAULT_VERSION_PATH};

use crate::error::{BundleError, ResolveError};
use crate::memo::{FailurePolicy, MemoizedVersion, ResolutionState};
use crate::resolver::VersionResolver;

/// Version endpoint bound to a URL path.
///
/// Cheap to clone; clones share the same memoization cell, so the resolver is
/// called at most once per endpoint no matter how many clones serve requests.
#[derive(Clone)]
pub struct VersionEndpoint {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: Arc<dyn VersionResolver>,
    path: String,
    memo: MemoizedVersion,
}

impl std::fmt::Debug for VersionEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionEndpoint")
            .field("path", &self.inner.path)
            .field("memo", &self.inner.memo)
            .finish_non_exhaustive()
    }
}

impl VersionEndpoint {
    /// Create an endpoint on the default path (`/version`).
    pub fn new(resolver: impl VersionResolver + 'static) -> Self {
        Self::from_parts(
            Arc::new(resolver),
            DEFAULT_VERSION_PATH.to_string(),
            FailurePolicy::default(),
        )
    }

    /// Create an endpoint on `path`.
    pub fn with_path(
        resolver: impl VersionResolver + 'static,
        path: impl Into<String>,
    ) -> Result<Self, BundleError> {
        Self::builder().resolver(resolver).path(path).build()
    }

    pub fn builder() -> VersionEndpointBuilder {
        VersionEndpointBuilder::default()
    }

    fn from_parts(
        resolver: Arc<dyn VersionResolver>,
        path: String,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                resolver,
                path,
                memo: MemoizedVersion::new(policy),
            }),
        }
    }

    /// URL path this endpoint answers on.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.inner.memo.policy()
    }

    pub fn state(&self) -> ResolutionState {
        self.inner.memo.state()
    }

    /// Resolve the version, or return the memoized outcome.
    ///
    /// The resolver may block, so the first resolution runs on the blocking
    /// pool. Dropping this future does not abort an in-flight resolution.
    pub async fn version(&self) -> Result<String, ResolveError> {
        if let Some(outcome) = self.inner.memo.get() {
            return outcome;
        }

        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.memo.get_or_resolve(inner.resolver.as_ref()))
            .await
            .unwrap_or_else(|e| Err(ResolveError::Panicked(e.to_string())))
    }

    /// Router fragment serving this endpoint on its path.
    ///
    /// The returned router carries its own state and can be merged into any
    /// host router.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route(&self.inner.path, any(handle_version))
            .with_state(self.clone())
    }
}

/// Builder for [`VersionEndpoint`], validating its inputs.
#[derive(Default)]
pub struct VersionEndpointBuilder {
    resolver: Option<Arc<dyn VersionResolver>>,
    path: Option<String>,
    failure_policy: FailurePolicy,
}

impl VersionEndpointBuilder {
    pub fn resolver(mut self, resolver: impl VersionResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Use a resolver shared with the rest of the application.
    pub fn shared_resolver(mut self, resolver: Arc<dyn VersionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn build(self) -> Result<VersionEndpoint, BundleError> {
        let resolver = self.resolver.ok_or_else(|| {
            BundleError::InvalidArgument("a version resolver is required".to_string())
        })?;
        let path = self
            .path
            .unwrap_or_else(|| DEFAULT_VERSION_PATH.to_string());
        validate_path(&path)?;

        Ok(VersionEndpoint::from_parts(
            resolver,
            path,
            self.failure_policy,
        ))
    }
}

/// Check that `path` can be registered as a plain route.
fn validate_path(path: &str) -> Result<(), BundleError> {
    if path.is_empty() {
        return Err(BundleError::InvalidArgument(
            "version path must not be empty".to_string(),
        ));
    }
    if !path.starts_with('/') {
        return Err(BundleError::InvalidArgument(format!(
            "version path must start with '/': {}",
            path
        )));
    }
    if let Some(c) = path
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '{' | '}' | '*'))
    {
        return Err(BundleError::InvalidArgument(format!(
            "version path contains invalid character {:?}: {}",
            c, path
        )));
    }
    // axum treats `:name` segments as the old capture syntax and refuses them.
    if path.split('/').any(|segment| segment.starts_with(':')) {
        return Err(BundleError::InvalidArgument(format!(
            "version path segments must not start with ':': {}",
            path
        )));
    }
    Ok(())
}

/// Get the application version
///
/// Resolves the version on the first request and serves the memoized outcome,
/// success or failure, to every later request.
#[utoipa::path(
    get,
    path = "/version",
    tag = "Admin",
    responses(
        (status = 200, description = "Application version", body = VersionResponse),
        (status = 405, description = "Method other than GET", body = ErrorResponse),
        (status = 500, description = "Version could not be resolved", body = ErrorResponse)
    )
)]
pub async fn handle_version(State(endpoint): State<VersionEndpoint>, method: Method) -> Response {
    if method != Method::GET {
        warn!(
            "Rejecting {} request on version endpoint {}",
            method,
            endpoint.path()
        );
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET")],
            Json(ErrorResponse::new(format!("Method {} not allowed", method))),
        )
            .into_response();
    }

    match endpoint.version().await {
        Ok(version) => {
            debug!("Serving application version {}", version);
            (StatusCode::OK, Json(VersionResponse { version })).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_details(
                "Failed to resolve application version",
                e.to_string(),
            )),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticVersion;

    #[test]
    fn test_default_path() {
        let endpoint = VersionEndpoint::new(StaticVersion::new("1.0.0"));
        assert_eq!(endpoint.path(), "/version");
        assert_eq!(endpoint.failure_policy(), FailurePolicy::Memoize);
        assert_eq!(endpoint.state(), ResolutionState::Unresolved);
    }

    #[test]
    fn test_builder_defaults_path() {
        let endpoint = VersionEndpoint::builder()
            .resolver(StaticVersion::new("1.0.0"))
            .build()
            .unwrap();
        assert_eq!(endpoint.path(), DEFAULT_VERSION_PATH);
    }

    #[test]
    fn test_missing_resolver_is_invalid() {
        let err = VersionEndpoint::builder().path("/version").build().unwrap_err();
        assert!(matches!(err, BundleError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let err = VersionEndpoint::with_path(StaticVersion::new("1.0.0"), "").unwrap_err();
        assert_eq!(
            err,
            BundleError::InvalidArgument("version path must not be empty".to_string())
        );
    }

    #[test]
    fn test_unroutable_paths_are_invalid() {
        for path in [
            "version",
            "/ver sion",
            "/{id}",
            "/files/*rest",
            "/:version",
            "/admin/:v",
        ] {
            let result = VersionEndpoint::with_path(StaticVersion::new("1.0.0"), path);
            assert!(
                matches!(result, Err(BundleError::InvalidArgument(_))),
                "{} should be rejected",
                path
            );
        }
    }

    #[test]
    fn test_colon_inside_segment_is_routable() {
        let endpoint =
            VersionEndpoint::with_path(StaticVersion::new("1.0.0"), "/admin/build:version")
                .unwrap();
        let _router: Router = endpoint.router();
        assert_eq!(endpoint.path(), "/admin/build:version");
    }

    #[test]
    fn test_custom_path() {
        let endpoint =
            VersionEndpoint::with_path(StaticVersion::new("1.0.0"), "/admin/build-version")
                .unwrap();
        assert_eq!(endpoint.path(), "/admin/build-version");
    }

    #[tokio::test]
    async fn test_version_is_memoized_across_clones() {
        let endpoint = VersionEndpoint::new(StaticVersion::new("1.2.3"));
        let clone = endpoint.clone();

        assert_eq!(endpoint.version().await, Ok("1.2.3".to_string()));
        assert_eq!(
            clone.state(),
            ResolutionState::Resolved("1.2.3".to_string())
        );
    }
}
