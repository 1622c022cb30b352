//! Registration of the version endpoint on an admin router.
//!
//! [`VersionBundle`] is what an embedding application keeps around at
//! startup: it is validated when constructed and merged into the admin
//! listener's routing table with [`VersionBundle::register`].

use axum::Router;
use tracing::info;

use crate::endpoint::VersionEndpoint;
use crate::error::BundleError;
use crate::resolver::VersionResolver;

#[derive(Debug, Clone)]
pub struct VersionBundle {
    endpoint: VersionEndpoint,
}

impl VersionBundle {
    /// Expose the version on the default URL (`/version`).
    pub fn new(resolver: impl VersionResolver + 'static) -> Self {
        Self {
            endpoint: VersionEndpoint::new(resolver),
        }
    }

    /// Expose the version on `url`.
    pub fn with_url(
        resolver: impl VersionResolver + 'static,
        url: impl Into<String>,
    ) -> Result<Self, BundleError> {
        Ok(Self {
            endpoint: VersionEndpoint::with_path(resolver, url)?,
        })
    }

    pub fn from_endpoint(endpoint: VersionEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn url(&self) -> &str {
        self.endpoint.path()
    }

    pub fn endpoint(&self) -> &VersionEndpoint {
        &self.endpoint
    }

    /// Add the version route to `router`.
    pub fn register<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        info!("Registering version endpoint on {}", self.url());
        router.merge(self.endpoint.router())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticVersion;

    #[test]
    fn test_bundle_default_url() {
        let bundle = VersionBundle::new(StaticVersion::new("1.0.0"));
        assert_eq!(bundle.url(), "/version");
    }

    #[test]
    fn test_bundle_rejects_empty_url() {
        let result = VersionBundle::with_url(StaticVersion::new("1.0.0"), "");
        assert!(matches!(result, Err(BundleError::InvalidArgument(_))));
    }
}
