//! Terminal front end for the `OpenAnimal` client.
//!
//! Polls the simulation API and prints each part of the view as it
//! changes. Commands typed on stdin (see `help`) select animals, birth new
//! ones and sign in.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing, to stderr)
//! 2. Load configuration from `OPENANIMAL_CONFIG` or the environment
//! 3. Open the durable state file
//! 4. Wire the HTTP client, identity resolver and renderer into the engine
//! 5. Read commands from stdin on a dedicated thread and forward Ctrl-C
//!    as shutdown
//! 6. Run the synchronization loop until shutdown

mod error;
mod input;
mod render;
mod state;

use std::path::PathBuf;

use openanimal_client::storage::BestEffortStore;
use openanimal_client::{ApiClient, ClientConfig, Command, IdentityResolver, SyncEngine};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::WatchError;
use crate::input::{HELP, forward_lines};
use crate::render::TerminalRenderer;
use crate::state::StateStore;

/// Commands buffered between the stdin reader and the engine.
const COMMAND_BUFFER: usize = 32;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the HTTP client
/// cannot be built. Nothing after startup is fatal.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("openanimal-watch starting");

    let config = load_config()?;
    info!(
        api_url = config.api_url,
        poll_interval_secs = config.poll_interval_secs,
        identity_policy = ?config.identity_policy,
        state_dir = %config.state_dir.display(),
        mirror_cookie = config.mirror_cookie,
        "configuration loaded"
    );

    let api = ApiClient::new(&config)?;
    let cookie = config.mirror_cookie.then(|| api.cookie_mirror());
    let storage = BestEffortStore::new(StateStore::open(&config.state_file()));
    let identity = IdentityResolver::new(config.identity_policy, storage, cookie);
    let renderer = TerminalRenderer::new(std::io::stdout());
    let engine = SyncEngine::new(api, identity, renderer, config.poll_interval());

    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let stdin_tx = tx.clone();
    std::thread::Builder::new()
        .name("stdin".to_owned())
        .spawn(move || forward_lines(std::io::stdin().lock(), &stdin_tx))?;
    tokio::spawn(forward_interrupt(tx));

    println!("{HELP}");
    engine.run(rx).await;

    info!("openanimal-watch stopped");
    Ok(())
}

/// `OPENANIMAL_CONFIG` names an optional YAML file; without it, defaults
/// plus environment overrides.
fn load_config() -> Result<ClientConfig, WatchError> {
    match std::env::var_os("OPENANIMAL_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            info!(path = %path.display(), "loading configuration file");
            Ok(ClientConfig::from_file(&path)?)
        }
        None => Ok(ClientConfig::from_env()?),
    }
}

/// Turn Ctrl-C into [`Command::Shutdown`].
async fn forward_interrupt(tx: mpsc::Sender<Command>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        return;
    }
    info!("interrupt received, shutting down");
    if tx.send(Command::Shutdown).await.is_err() {
        debug!("engine already stopped");
    }
}
