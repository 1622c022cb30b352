//! Version resolvers.
//!
//! A [`VersionResolver`] produces the application's version identifier. The
//! endpoint calls it at most once, so implementations are free to be slow or
//! blocking (reading files, probing the build, calling another service).

use anyhow::{ensure, Context};
use std::path::{Path, PathBuf};

use crate::version::BuildInfo;

/// Produces the version string served by the version endpoint.
///
/// Any `Fn() -> anyhow::Result<String>` closure is a resolver as well.
pub trait VersionResolver: Send + Sync {
    fn resolve(&self) -> anyhow::Result<String>;
}

impl<F> VersionResolver for F
where
    F: Fn() -> anyhow::Result<String> + Send + Sync,
{
    fn resolve(&self) -> anyhow::Result<String> {
        self()
    }
}

/// Resolver returning a fixed value.
#[derive(Debug, Clone)]
pub struct StaticVersion(String);

impl StaticVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }
}

impl VersionResolver for StaticVersion {
    fn resolve(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Resolver reading the version from a file such as `VERSION` or `.version`.
///
/// Surrounding whitespace is trimmed; an empty file is a failure.
#[derive(Debug, Clone)]
pub struct FileVersion {
    path: PathBuf,
}

impl FileVersion {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VersionResolver for FileVersion {
    fn resolve(&self) -> anyhow::Result<String> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read version file {}", self.path.display()))?;
        let version = content.trim();
        ensure!(
            !version.is_empty(),
            "Version file {} is empty",
            self.path.display()
        );
        Ok(version.to_string())
    }
}

/// Resolver reading the version from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvVersion {
    var: String,
}

impl EnvVersion {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl VersionResolver for EnvVersion {
    fn resolve(&self) -> anyhow::Result<String> {
        let value = std::env::var(&self.var)
            .with_context(|| format!("Environment variable {} is not set", self.var))?;
        let version = value.trim();
        ensure!(
            !version.is_empty(),
            "Environment variable {} is empty",
            self.var
        );
        Ok(version.to_string())
    }
}

/// Resolver reporting the version this binary was built from.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildInfoVersion;

impl VersionResolver for BuildInfoVersion {
    fn resolve(&self) -> anyhow::Result<String> {
        Ok(BuildInfo::get().version_string())
    }
}
