//! Configuration management.

use anyhow::Context;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use crate::endpoint::VersionEndpoint;
use crate::memo::FailurePolicy;
use crate::resolver::{BuildInfoVersion, EnvVersion, FileVersion, StaticVersion, VersionResolver};

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    admin: AdminConfig,
    #[serde(default)]
    version: VersionConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdminConfig {
    #[serde(default = "default_bind")]
    bind: IpAddr,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionConfig {
    #[serde(default = "default_path")]
    path: String,
    #[serde(default)]
    failure_policy: FailurePolicy,
    #[serde(default)]
    source: VersionSource,
    /// Version served by the `static` source
    value: Option<String>,
    /// File read by the `file` source
    file: Option<PathBuf>,
    /// Variable read by the `env` source
    env_var: Option<String>,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            failure_policy: FailurePolicy::default(),
            source: VersionSource::default(),
            value: None,
            file: None,
            env_var: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    log_level: Option<String>,
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    verso_types::DEFAULT_ADMIN_PORT
}

fn default_path() -> String {
    verso_types::DEFAULT_VERSION_PATH.to_string()
}

/// Where the served version comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    /// Version and git metadata embedded at build time
    #[default]
    Build,
    /// Fixed value from `version.value`
    Static,
    /// Contents of `version.file`
    File,
    /// Environment variable named by `version.env_var`
    Env,
}

/// Values given on the command line, overriding every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub version_path: Option<String>,
    pub failure_policy: Option<FailurePolicy>,
    /// Serve this fixed version (implies the `static` source)
    pub version_value: Option<String>,
    /// Read the version from this file (implies the `file` source)
    pub version_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the admin listener binds to
    pub bind: IpAddr,
    /// Port of the admin listener
    pub port: u16,
    /// URL path of the version endpoint
    pub version_path: String,
    /// Whether a resolution failure is permanent
    pub failure_policy: FailurePolicy,
    pub version_source: VersionSource,
    pub version_value: Option<String>,
    pub version_file: Option<PathBuf>,
    pub version_env_var: Option<String>,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `config.toml` in user config directory (~/.config/verso/ on Linux)
    /// 2. `.verso.toml` in current directory
    ///
    /// Environment variables use the `VERSO_` prefix with `__` between section
    /// and key, e.g. `VERSO_ADMIN__PORT=9090` or `VERSO_VERSION__FAILURE_POLICY=retry`.
    pub fn from_figment(overrides: ConfigOverrides) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir().ok().map(|d| d.join(".verso.toml"));
        let user_config = directories::ProjectDirs::from("", "", "verso")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // 1. Start with defaults
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile::default()));

        // 2. Merge user config file if it exists
        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // 3. Merge local config file if it exists
        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // 4. Merge environment variables (VERSO_* prefix)
        figment = figment.merge(Env::prefixed("VERSO_").split("__"));

        // 5. Merge CLI arguments (highest priority)
        if let Some(bind) = overrides.bind {
            figment = figment.merge(Serialized::default("admin.bind", bind));
        }
        if let Some(port) = overrides.port {
            figment = figment.merge(Serialized::default("admin.port", port));
        }
        if let Some(ref path) = overrides.version_path {
            figment = figment.merge(Serialized::default("version.path", path));
        }
        if let Some(policy) = overrides.failure_policy {
            figment = figment.merge(Serialized::default("version.failure_policy", policy));
        }
        if let Some(ref value) = overrides.version_value {
            figment = figment
                .merge(Serialized::default("version.source", VersionSource::Static))
                .merge(Serialized::default("version.value", value));
        }
        if let Some(ref file) = overrides.version_file {
            figment = figment
                .merge(Serialized::default("version.source", VersionSource::File))
                .merge(Serialized::default("version.file", file));
        }
        if let Some(ref level) = overrides.log_level {
            figment = figment.merge(Serialized::default("logging.log_level", level));
        }

        let config_file: ConfigFile = figment.extract()?;
        Ok(Self::from(config_file))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Build the resolver selected by `version_source`.
    ///
    /// A source missing its parameter is reported here, before anything binds.
    pub fn resolver(&self) -> anyhow::Result<Arc<dyn VersionResolver>> {
        let resolver: Arc<dyn VersionResolver> = match self.version_source {
            VersionSource::Build => Arc::new(BuildInfoVersion),
            VersionSource::Static => {
                let value = self
                    .version_value
                    .clone()
                    .context("version source \"static\" requires version.value")?;
                Arc::new(StaticVersion::new(value))
            }
            VersionSource::File => {
                let file = self
                    .version_file
                    .clone()
                    .context("version source \"file\" requires version.file")?;
                Arc::new(FileVersion::new(file))
            }
            VersionSource::Env => {
                let var = self
                    .version_env_var
                    .clone()
                    .context("version source \"env\" requires version.env_var")?;
                Arc::new(EnvVersion::new(var))
            }
        };
        Ok(resolver)
    }

    /// Build the version endpoint described by this configuration.
    pub fn version_endpoint(&self) -> anyhow::Result<VersionEndpoint> {
        let endpoint = VersionEndpoint::builder()
            .shared_resolver(self.resolver()?)
            .path(self.version_path.clone())
            .failure_policy(self.failure_policy)
            .build()?;
        Ok(endpoint)
    }
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Self {
            bind: file.admin.bind,
            port: file.admin.port,
            version_path: file.version.path,
            failure_policy: file.version.failure_policy,
            version_source: file.version.source,
            version_value: file.version.value,
            version_file: file.version.file,
            version_env_var: file.version.env_var,
            log_file: file.logging.log_file,
            log_level: file.logging.log_level,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from(ConfigFile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::ResolutionState;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    /// Load configuration from inside `dir` so a `.verso.toml` there is picked up.
    fn load_in(dir: &TempDir, overrides: ConfigOverrides) -> anyhow::Result<Config> {
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();

        let config = Config::from_figment(overrides);

        // Restore (ignore errors)
        let _ = std::env::set_current_dir(original_dir);
        config
    }

    fn clear_env() {
        std::env::remove_var("VERSO_ADMIN__PORT");
        std::env::remove_var("VERSO_VERSION__PATH");
        std::env::remove_var("VERSO_VERSION__FAILURE_POLICY");
    }

    #[test]
    #[serial]
    fn test_from_figment_defaults() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();

        let config = load_in(&temp_dir, ConfigOverrides::default()).unwrap();

        assert_eq!(config.port, verso_types::DEFAULT_ADMIN_PORT);
        assert_eq!(config.version_path, "/version");
        assert_eq!(config.failure_policy, FailurePolicy::Memoize);
        assert_eq!(config.version_source, VersionSource::Build);
        assert!(config.log_level.is_none());
    }

    #[test]
    #[serial]
    fn test_from_figment_config_file() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"
[admin]
bind = "127.0.0.1"
port = 7777

[version]
path = "/admin/version"
failure_policy = "retry"
source = "static"
value = "4.5.6"
"#;
        fs::write(temp_dir.path().join(".verso.toml"), config_content).unwrap();

        let config = load_in(&temp_dir, ConfigOverrides::default()).unwrap();

        assert_eq!(
            config.socket_addr(),
            "127.0.0.1:7777".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.version_path, "/admin/version");
        assert_eq!(config.failure_policy, FailurePolicy::Retry);
        assert_eq!(config.version_source, VersionSource::Static);
        assert_eq!(config.version_value.as_deref(), Some("4.5.6"));
    }

    #[test]
    #[serial]
    fn test_from_figment_env_vars_override_config_file() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".verso.toml"), "[admin]\nport = 7777").unwrap();

        std::env::set_var("VERSO_ADMIN__PORT", "8888");
        std::env::set_var("VERSO_VERSION__FAILURE_POLICY", "retry");
        let config = load_in(&temp_dir, ConfigOverrides::default());
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.port, 8888);
        assert_eq!(config.failure_policy, FailurePolicy::Retry);
    }

    #[test]
    #[serial]
    fn test_from_figment_cli_overrides_env_and_config() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".verso.toml"),
            "[admin]\nport = 7777\n\n[version]\npath = \"/from-file\"",
        )
        .unwrap();

        std::env::set_var("VERSO_ADMIN__PORT", "8888");
        let config = load_in(
            &temp_dir,
            ConfigOverrides {
                port: Some(9999),
                version_path: Some("/from-cli".to_string()),
                version_value: Some("7.0.0".to_string()),
                ..Default::default()
            },
        );
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.version_path, "/from-cli");
        assert_eq!(config.version_source, VersionSource::Static);
        assert_eq!(config.version_value.as_deref(), Some("7.0.0"));
    }

    #[test]
    fn test_resolver_requires_source_parameter() {
        for source in [VersionSource::Static, VersionSource::File, VersionSource::Env] {
            let config = Config {
                version_source: source,
                ..Config::default()
            };
            assert!(config.resolver().is_err(), "{:?} should need a parameter", source);
        }
    }

    #[test]
    fn test_version_endpoint_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let version_file = temp_dir.path().join("VERSION");
        fs::write(&version_file, "5.0.0\n").unwrap();

        let config = Config {
            version_path: "/app/version".to_string(),
            failure_policy: FailurePolicy::Retry,
            version_source: VersionSource::File,
            version_file: Some(version_file),
            ..Config::default()
        };

        let endpoint = config.version_endpoint().unwrap();
        assert_eq!(endpoint.path(), "/app/version");
        assert_eq!(endpoint.failure_policy(), FailurePolicy::Retry);
        assert_eq!(endpoint.state(), ResolutionState::Unresolved);
    }

    #[test]
    fn test_version_endpoint_rejects_empty_path() {
        let config = Config {
            version_path: String::new(),
            ..Config::default()
        };
        assert!(config.version_endpoint().is_err());
    }
}
