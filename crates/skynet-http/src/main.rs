//! Skynet HTTP file service: command-line entry point.
//!
//! Starts the embedded file service on one network interface, logs the URL
//! other devices should open, and stops the server gracefully on Ctrl+C.
//!
//! # Usage
//!
//! ```text
//! skynet-http [OPTIONS]
//!
//! Options:
//!   -p, --port <PORT>              Listen port [default: 8080]
//!   -d, --dir <DIR>                Serving directory [default: current dir]
//!   -a, --address <IP>             Bind address [default: 0.0.0.0]
//!   -i, --interface <INDEX>        Index into --list-interfaces output
//!   -m, --mode <MODE>              download | upload | all [default: all]
//!       --list-interfaces          Print bind candidates and exit
//!       --max-upload-mb <MB>       Upload size cap [default: 100]
//!       --grace-secs <SECS>        Shutdown grace period [default: 5]
//!       --on-collision <POLICY>    overwrite | reject | rename [default: rename]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable               | Flag              |
//! |------------------------|-------------------|
//! | `SKYNET_PORT`          | `--port`          |
//! | `SKYNET_DIR`           | `--dir`           |
//! | `SKYNET_ADDRESS`       | `--address`       |
//! | `SKYNET_INTERFACE`     | `--interface`     |
//! | `SKYNET_MODE`          | `--mode`          |
//! | `SKYNET_MAX_UPLOAD_MB` | `--max-upload-mb` |
//! | `SKYNET_GRACE_SECS`    | `--grace-secs`    |
//! | `SKYNET_ON_COLLISION`  | `--on-collision`  |
//!
//! Command-line arguments take precedence over environment variables.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use skynet_core::env::{invoking_user, platform_variable};
use skynet_core::{
    validate_existing_directory, CollisionPolicy, NetworkInterface, ServiceMode, ServiceSettings,
    DEFAULT_PORT,
};
use skynet_http::infrastructure::{list_interfaces, running_elevated, ServiceManager};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Share a directory over HTTP on the local network.
#[derive(Debug, Parser)]
#[command(
    name = "skynet-http",
    about = "Serve a directory for download and/or upload over HTTP",
    version
)]
struct Cli {
    /// TCP port to listen on.  Ports below 1024 require root.
    #[arg(short, long, default_value_t = u32::from(DEFAULT_PORT), env = "SKYNET_PORT")]
    port: u32,

    /// Directory to serve.  Must already exist.
    #[arg(short, long, env = "SKYNET_DIR")]
    dir: Option<PathBuf>,

    /// IP address to bind.  `0.0.0.0` listens on every interface.
    #[arg(short, long, default_value = "0.0.0.0", env = "SKYNET_ADDRESS")]
    address: String,

    /// Bind the interface at this index of `--list-interfaces`.  Overrides
    /// `--address`.
    #[arg(short, long, env = "SKYNET_INTERFACE")]
    interface: Option<usize>,

    /// Which routes to serve: `download`, `upload` or `all`.
    #[arg(short, long, default_value = "all", env = "SKYNET_MODE")]
    mode: ServiceMode,

    /// Print the bind candidates and exit.
    #[arg(long)]
    list_interfaces: bool,

    /// Largest accepted upload, in MiB.
    #[arg(long, default_value_t = 100, env = "SKYNET_MAX_UPLOAD_MB")]
    max_upload_mb: u64,

    /// Seconds to wait for in-flight requests when stopping.
    #[arg(long, default_value_t = 5, env = "SKYNET_GRACE_SECS")]
    grace_secs: u64,

    /// What to do when an upload's filename already exists.
    #[arg(long, default_value = "rename", env = "SKYNET_ON_COLLISION")]
    on_collision: CollisionPolicy,
}

/// Everything needed for one `ServiceManager::start` call.
#[derive(Debug)]
struct LaunchConfig {
    mode: ServiceMode,
    ip: IpAddr,
    port: u32,
    dir: PathBuf,
    settings: ServiceSettings,
}

impl Cli {
    /// Converts the parsed arguments into a [`LaunchConfig`].
    ///
    /// `candidates` is the `list_interfaces()` snapshot used to resolve
    /// `--interface`.
    ///
    /// # Errors
    ///
    /// Returns an error if `--address` is not an IP address, `--interface` is
    /// out of range, or the serving directory does not exist.
    fn into_launch_config(self, candidates: &[NetworkInterface]) -> anyhow::Result<LaunchConfig> {
        let ip = match self.interface {
            Some(index) => match candidates.get(index) {
                Some(candidate) => IpAddr::V4(candidate.ip),
                None => bail!(
                    "interface index {index} out of range (0..{})",
                    candidates.len()
                ),
            },
            None => self
                .address
                .parse()
                .with_context(|| format!("invalid bind address: '{}'", self.address))?,
        };

        let cwd = std::env::current_dir().context("cannot determine the current directory")?;
        let requested = self
            .dir
            .or_else(|| platform_variable("PWD").map(PathBuf::from))
            .unwrap_or_else(|| cwd.clone());
        let dir = validate_existing_directory(&requested, &cwd)?;

        let max_upload_bytes = usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024))
            .with_context(|| format!("--max-upload-mb {} is too large", self.max_upload_mb))?;

        Ok(LaunchConfig {
            mode: self.mode,
            ip,
            port: self.port,
            dir,
            settings: ServiceSettings {
                max_upload_bytes,
                shutdown_grace: Duration::from_secs(self.grace_secs),
                collision: self.on_collision,
                allow_privileged_ports: running_elevated(),
            },
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls verbosity; default to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Some(user) = invoking_user() {
        debug!("launched by {user}");
    }

    if cli.list_interfaces {
        let candidates = list_interfaces().context("cannot list network interfaces")?;
        for (index, candidate) in candidates.iter().enumerate() {
            println!("{index}: {candidate}");
        }
        return Ok(());
    }

    let candidates = if cli.interface.is_some() {
        list_interfaces().context("cannot list network interfaces")?
    } else {
        Vec::new()
    };
    let config = cli.into_launch_config(&candidates)?;

    let manager = ServiceManager::new(config.settings);
    let handle = manager
        .start(config.mode, config.ip, config.port, &config.dir)
        .await
        .context("failed to start the HTTP service")?;

    info!("serving {} at {}", handle.dir().display(), handle.url());
    info!("press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    info!("received Ctrl+C; shutting down");
    manager
        .stop(&handle)
        .await
        .context("failed to stop the HTTP service")?;

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
