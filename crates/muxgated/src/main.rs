// ABOUTME: Daemon entry point for the muxgate SSH gateway.
// ABOUTME: Loads a configuration source, serves reloads on SIGHUP, shuts down on ctrl-c.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use muxgate_config::{
    error::Result as SourceResult, structured, AuthorizedKeysSource, ConfigSource,
    RegistrySet, ReloadCoordinator, Settings, StructuredSource,
};
use muxgate_core::{ConnMeta, Gateway, SigningKeyHandle, Snapshot, SnapshotHandle};
use ssh_key::{PrivateKey, PublicKey};
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "muxgated")]
#[command(about = "SSH gateway credential and routing daemon")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and exit
    Check,

    /// Print the routing decision for a public key and exit
    Resolve {
        /// OpenSSH public key file to resolve
        #[arg(long)]
        key: PathBuf,

        /// Username to report in the audit log
        #[arg(long, default_value = "operator")]
        username: String,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Structured TOML configuration file (defaults to ~/.config/muxgate/config.toml)
    #[arg(long, env = "MUXGATE_CONFIG")]
    config: Option<PathBuf>,

    /// authorized_keys-style credential file (requires --hostfile)
    #[arg(long, conflicts_with = "config", requires = "hostfile")]
    authkeys: Option<PathBuf>,

    /// Host-map file: address, comma-separated users, optional options per line
    #[arg(long, requires = "authkeys")]
    hostfile: Option<PathBuf>,

    /// Listen address handed to the SSH transport
    #[arg(long)]
    address: Option<String>,

    /// Path to the host signing key
    #[arg(long)]
    hostkey: Option<PathBuf>,
}

/// Configuration source selected at startup; one binary, pluggable formats.
enum Source {
    Structured(StructuredSource),
    Files(AuthorizedKeysSource),
}

impl ConfigSource for Source {
    fn describe(&self) -> String {
        match self {
            Source::Structured(s) => s.describe(),
            Source::Files(s) => s.describe(),
        }
    }

    fn load(&self) -> SourceResult<RegistrySet> {
        match self {
            Source::Structured(s) => s.load(),
            Source::Files(s) => s.load(),
        }
    }

    fn load_host_key(&self) -> SourceResult<Option<PrivateKey>> {
        match self {
            Source::Structured(s) => s.load_host_key(),
            Source::Files(s) => s.load_host_key(),
        }
    }
}

fn build_source(args: &SourceArgs) -> Result<(Source, Settings)> {
    if let (Some(authkeys), Some(hostfile)) = (&args.authkeys, &args.hostfile) {
        let settings = Settings {
            address: args
                .address
                .clone()
                .unwrap_or_else(|| structured::DEFAULT_ADDRESS.to_string()),
            hostkey: args
                .hostkey
                .clone()
                .unwrap_or_else(|| PathBuf::from(structured::DEFAULT_HOSTKEY)),
        };
        let source = Source::Files(AuthorizedKeysSource::new(authkeys, hostfile));
        return Ok((source, settings));
    }

    let path = args.config.clone().unwrap_or_else(StructuredSource::default_path);
    let source = StructuredSource::new(path);
    let mut settings = source
        .settings()
        .with_context(|| format!("reading configuration from {}", source.describe()))?;
    if let Some(address) = &args.address {
        settings.address = address.clone();
    }
    if let Some(hostkey) = &args.hostkey {
        settings.hostkey = hostkey.clone();
    }
    Ok((Source::Structured(source), settings))
}

#[tokio::main]
async fn main() -> Result<()> {
    muxgate_log::init();
    let cli = Cli::parse();

    let (source, settings) = build_source(&cli.source)?;

    match cli.command {
        Some(Commands::Check) => check(&source, &settings),
        Some(Commands::Resolve { key, username }) => resolve(&source, &key, username),
        None => serve(source, settings).await,
    }
}

/// Validate the configuration the way a startup load would, then exit.
fn check(source: &Source, settings: &Settings) -> Result<()> {
    let set = source
        .load()
        .with_context(|| format!("validating configuration from {}", source.describe()))?;
    PrivateKey::read_openssh_file(&settings.hostkey)
        .with_context(|| format!("validating host key at {}", settings.hostkey.display()))?;

    println!(
        "configuration ok: {} users, {} hosts",
        set.identities.len(),
        set.hosts.len()
    );
    Ok(())
}

/// Resolve one public key against the current configuration and print the
/// candidate backends, exercising the same path the SSH collaborator uses.
fn resolve(source: &Source, key_path: &std::path::Path, username: String) -> Result<()> {
    let presented = PublicKey::read_openssh_file(key_path)
        .with_context(|| format!("reading public key from {}", key_path.display()))?;

    let set = source
        .load()
        .with_context(|| format!("loading configuration from {}", source.describe()))?;
    let snapshots = SnapshotHandle::new(Snapshot::new(set.identities, set.hosts));
    let gateway = Gateway::new(snapshots);

    let meta = ConnMeta {
        remote_addr: "local".to_string(),
        username,
    };
    let Ok(mut session) = gateway.authenticate(&meta, &presented) else {
        bail!("access denied: key matches no identity and no default hosts exist");
    };
    gateway
        .session_setup(&mut session)
        .context("computing routes")?;

    println!("identity: {}", session.outcome().display_name());
    if session.remotes.is_empty() {
        println!("no reachable hosts");
    } else {
        for remote in &session.remotes {
            println!("{remote}");
        }
    }
    Ok(())
}

/// Run the daemon: fatal initial load, then live reloads until shutdown.
async fn serve(source: Source, settings: Settings) -> Result<()> {
    // Never start serving without a valid snapshot and host identity.
    let set = source
        .load()
        .with_context(|| format!("loading initial configuration from {}", source.describe()))?;
    let snapshot = Snapshot::new(set.identities, set.hosts);
    info!(
        source = %source.describe(),
        identities = snapshot.identities().len(),
        hosts = snapshot.hosts().len(),
        "initial registries loaded"
    );
    let snapshots = SnapshotHandle::new(snapshot);

    let host_key = PrivateKey::read_openssh_file(&settings.hostkey)
        .with_context(|| format!("loading host key from {}", settings.hostkey.display()))?;
    let signing_key = SigningKeyHandle::new(host_key);

    info!(
        address = %settings.address,
        "decision engine ready; the SSH transport attaches via muxgate_core::Gateway"
    );

    let coordinator =
        ReloadCoordinator::new(source, snapshots.clone()).with_signing_key(signing_key.clone());
    let (trigger, changes) = mpsc::channel(1);
    tokio::spawn(coordinator.run(changes));
    spawn_reload_trigger(trigger);

    shutdown_signal().await;
    info!("shut down");
    Ok(())
}

/// Forward SIGHUP to the reload coordinator as "configuration changed".
#[cfg(unix)]
fn spawn_reload_trigger(trigger: mpsc::Sender<()>) {
    tokio::spawn(async move {
        let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "failed to install SIGHUP handler; live reload disabled");
                return;
            }
        };
        while hangup.recv().await.is_some() {
            if trigger.send(()).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_trigger(_trigger: mpsc::Sender<()>) {
    warn!("live reload is only wired to SIGHUP on unix");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("received SIGTERM, shutting down...");
        }
    }
}
