//! Demo binary for the Accolade achievement engine.
//!
//! Wires the engine to the configured progress store and a broadcast sink,
//! then plays a short script: two subjects join (full resync, default
//! grants) and mine stone (step grants). Every sync message is printed to
//! stdout as one JSON line.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `accolade-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the example definition registry
//! 4. Open the progress store (in-memory or `PostgreSQL`)
//! 5. Subscribe a printer to the broadcast sink
//! 6. Run the script and log final progress

mod definitions;
mod error;

use std::path::Path;
use std::sync::Arc;

use accolade_db::{PostgresConfig, PostgresPool};
use accolade_engine::{
    AccoladeConfig, AchievementEngine, BroadcastSink, InMemoryStore, ProgressStore, Registry,
    StoreBackend,
};
use accolade_types::{SubjectId, SyncMessage};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::DemoError;

/// Stones each demo subject mines.
const SCRIPT: [(&str, u32); 2] = [("alex", 12), ("sam", 4)];

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    let config = load_config()?;
    init_logging(&config)?;
    info!(backend = ?config.store.backend, "accolade-demo starting");

    let registry = definitions::registry()?;
    info!(definitions = registry.len(), "Definitions loaded");

    match config.store.backend {
        StoreBackend::Memory => run(&config, registry, InMemoryStore::new()).await,
        StoreBackend::Postgres => {
            let pool = PostgresPool::connect(&PostgresConfig::from(&config.store)).await?;
            pool.run_migrations().await?;
            let result = run(&config, registry, pool.progress_store()).await;
            pool.close().await;
            result
        }
    }
}

/// Play the demo script against `store`.
async fn run<S: ProgressStore>(
    config: &AccoladeConfig,
    registry: Registry,
    store: S,
) -> Result<(), DemoError> {
    let sink = BroadcastSink::new(config.sync.channel_capacity);
    let printer = tokio::spawn(print_messages(sink.subscribe()));
    let engine = AchievementEngine::with_registry(registry, store, sink);

    let hello_world = definitions::hello_world()?;
    let mine_stone = definitions::mine_stone()?;

    for (name, stones) in SCRIPT {
        let subject = SubjectId::new();
        info!(%subject, name, "Subject joined");
        engine.show_all(subject).await?;
        let outcome = engine.grant(subject, &hello_world).await?;
        info!(%subject, ?outcome, "Join achievement granted");

        for _ in 0..stones {
            engine.grant_steps(subject, &mine_stone, 1).await?;
        }

        let progress = engine.progress_all(subject).await?;
        for (id, value) in &progress {
            info!(%subject, name, achievement = %id, progress = value, "Final progress");
        }
    }

    // Dropping the engine drops the last sender and ends the printer.
    drop(engine);
    if let Err(e) = printer.await {
        warn!(error = %e, "Message printer task failed");
    }
    Ok(())
}

/// Print every broadcast message as a JSON line until the channel closes.
async fn print_messages(mut rx: broadcast::Receiver<Arc<SyncMessage>>) {
    loop {
        match rx.recv().await {
            Ok(message) => match serde_json::to_string(&*message) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "Failed to serialize sync message"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Printer lagged behind, messages skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Load configuration from `accolade-config.yaml` in the working directory.
///
/// Falls back to defaults (plus env overrides) if the file does not exist.
fn load_config() -> Result<AccoladeConfig, DemoError> {
    let config_path = Path::new("accolade-config.yaml");
    if config_path.exists() {
        Ok(AccoladeConfig::from_file(config_path)?)
    } else {
        Ok(AccoladeConfig::parse("")?)
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the config level.
fn init_logging(config: &AccoladeConfig) -> Result<(), DemoError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| DemoError::Logging {
            message: format!("invalid log filter: {e}"),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let result = if config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| DemoError::Logging {
        message: e.to_string(),
    })
}
