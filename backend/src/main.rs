//! verso admin server.

use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{error, info};

use verso::config::{Config, ConfigOverrides};
use verso::version::BuildInfo;
use verso::{create_admin_app, logging, FailurePolicy, VersionBundle};

/// verso - serve the application version on an admin listener
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the admin listener to
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Port of the admin listener
    #[arg(short, long)]
    port: Option<u16>,

    /// URL path of the version endpoint
    #[arg(long)]
    path: Option<String>,

    /// Serve this fixed version instead of the build version
    #[arg(long, conflicts_with = "version_file")]
    static_version: Option<String>,

    /// Read the version from this file
    #[arg(long)]
    version_file: Option<PathBuf>,

    /// Resolve again on the next request after a failed resolution
    #[arg(long)]
    retry_on_failure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            bind: args.bind,
            port: args.port,
            version_path: args.path,
            failure_policy: args.retry_on_failure.then_some(FailurePolicy::Retry),
            version_value: args.static_version,
            version_file: args.version_file,
            log_level: args.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_figment(args.into())?;

    let _log_guard = logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;

    info!("Starting verso admin server {}", BuildInfo::get().describe());
    info!("Configuration loaded");

    let bundle = VersionBundle::from_endpoint(config.version_endpoint()?);
    let app = create_admin_app(&bundle)?;

    let addr = config.socket_addr();
    info!("Admin listener on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Set up graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down");
    Ok(())
}
