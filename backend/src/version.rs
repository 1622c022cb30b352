//! Build information embedded at compile time by `build.rs`.

/// Build and version information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Package version from Cargo.toml
    pub version: &'static str,
    /// Git commit hash (short)
    pub git_hash: &'static str,
    /// Git tag (if on a tagged commit)
    pub git_tag: &'static str,
    /// Git branch name
    pub git_branch: &'static str,
    /// Whether the working directory had uncommitted changes
    pub git_dirty: bool,
    /// Build timestamp (ISO 8601 format)
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    /// Get the build information of this binary
    pub fn get() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            git_tag: env!("GIT_TAG"),
            git_branch: env!("GIT_BRANCH"),
            git_dirty: env!("GIT_DIRTY") == "true",
            build_timestamp: env!("BUILD_TIMESTAMP"),
        }
    }

    /// Get a human-readable version string
    ///
    /// Returns:
    /// - "v0.1.0" if on a tagged release
    /// - "v0.1.0-dev+abc12345" if not on a tag
    /// - "v0.1.0-dev+abc12345-dirty" if there are uncommitted changes
    pub fn version_string(&self) -> String {
        if !self.git_tag.is_empty() {
            self.git_tag.to_string()
        } else {
            let mut version = format!("v{}-dev+{}", self.version, self.git_hash);
            if self.git_dirty {
                version.push_str("-dirty");
            }
            version
        }
    }

    /// Version string with the branch and time it was built from, for logs
    pub fn describe(&self) -> String {
        format!(
            "{} (branch {}, built {})",
            self.version_string(),
            self.git_branch,
            self.build_timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_build(dirty: bool) -> BuildInfo {
        BuildInfo {
            version: "1.2.3",
            git_hash: "abc12345",
            git_tag: "",
            git_branch: "main",
            git_dirty: dirty,
            build_timestamp: "2024-01-01T00:00:00+00:00",
        }
    }

    #[test]
    fn test_build_info() {
        let info = BuildInfo::get();

        // These should always be set by build.rs
        assert!(!info.version.is_empty());
        assert!(!info.git_hash.is_empty());
        assert!(!info.build_timestamp.is_empty());
        assert!(!info.version_string().is_empty());
    }

    #[test]
    fn test_version_string_dev() {
        assert_eq!(dev_build(false).version_string(), "v1.2.3-dev+abc12345");
        assert_eq!(dev_build(true).version_string(), "v1.2.3-dev+abc12345-dirty");
    }

    #[test]
    fn test_describe_includes_branch_and_timestamp() {
        assert_eq!(
            dev_build(false).describe(),
            "v1.2.3-dev+abc12345 (branch main, built 2024-01-01T00:00:00+00:00)"
        );
    }

    #[test]
    fn test_version_string_tagged() {
        let info = BuildInfo {
            git_tag: "v1.2.3",
            ..dev_build(true)
        };
        assert_eq!(info.version_string(), "v1.2.3");
    }
}
