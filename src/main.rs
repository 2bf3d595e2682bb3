//! Meteo state tool - drives the shared state core from the command line.
//!
//! Loads the configured slot defaults, applies writes or broadcasts, waits
//! for every observer to finish and prints the result.

use std::{
    error::Error,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{Level, info, instrument, span};

use meteo::{
    config::Config,
    state::{Notification, ObserverRef, StateError, StateManager},
    tracing_config,
};

#[derive(Parser)]
#[command(name = "meteo")]
#[command(about = "Inspect and drive the meteo shared state")]
struct Cli {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/meteo/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to ~/.meteo/logs
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the initial slot values
    Defaults,
    /// Apply KEY=VALUE writes as one batch and print the resulting state
    Apply {
        /// Assignments; values are parsed as JSON, falling back to a string
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Broadcast a JSON payload on a topic
    Broadcast {
        /// Topic name, e.g. "language_event"
        topic: String,
        /// JSON payload
        payload: String,
    },
    /// Print the configuration JSON schema
    Schema,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if cli.log_file {
        tracing_config::init_with_file(config.general.log_level)?;
    } else {
        tracing_config::init(config.general.log_level)?;
    }
    let _span = span!(Level::INFO, "meteo").entered();

    match cli.command {
        Commands::Defaults => {
            let state = StateManager::from_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
        }
        Commands::Apply { assignments } => apply(&config, &assignments).await?,
        Commands::Broadcast { topic, payload } => broadcast(&config, &topic, &payload).await?,
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&Config::schema())?);
        }
    }

    Ok(())
}

#[instrument(skip(config))]
async fn apply(config: &Config, assignments: &[String]) -> Result<(), Box<dyn Error>> {
    let writes = assignments
        .iter()
        .map(|assignment| parse_assignment(assignment))
        .collect::<Result<Vec<_>, _>>()?;

    let state = StateManager::from_config(config)?;
    let delivered = Arc::new(AtomicUsize::new(0));
    let observer = logging_observer(&delivered);
    for (key, _) in &writes {
        state.register_observer(key, &observer);
    }

    state.update_state(writes).await;
    state.shutdown().await;

    info!(
        notifications = delivered.load(Ordering::SeqCst),
        "Batch applied"
    );
    println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
    Ok(())
}

#[instrument(skip(config))]
async fn broadcast(config: &Config, topic: &str, payload: &str) -> Result<(), Box<dyn Error>> {
    let data = parse_value(topic, payload)?;

    let state = StateManager::from_config(config)?;
    let delivered = Arc::new(AtomicUsize::new(0));
    state.register_observer(topic, &logging_observer(&delivered));

    state.notify_all(topic, data).await;
    state.shutdown().await;

    println!(
        "{topic}: delivered to {} observer(s)",
        delivered.load(Ordering::SeqCst)
    );
    Ok(())
}

fn logging_observer(delivered: &Arc<AtomicUsize>) -> ObserverRef<Value> {
    let delivered = Arc::clone(delivered);
    ObserverRef::from_fn("cli", move |event: Notification<Value>| {
        delivered.fetch_add(1, Ordering::SeqCst);
        match event {
            Notification::Changed(change) => info!(
                key = %change.key,
                old = ?change.old_value,
                new = %change.new_value,
                "Slot changed"
            ),
            Notification::Broadcast(data) => info!(payload = %data, "Broadcast received"),
        }
    })
}

fn parse_assignment(assignment: &str) -> Result<(String, Value), StateError> {
    let (key, raw) = assignment
        .split_once('=')
        .ok_or_else(|| StateError::InvalidValue {
            key: assignment.to_string(),
            details: "expected KEY=VALUE".to_string(),
        })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(StateError::InvalidValue {
            key: assignment.to_string(),
            details: "empty key".to_string(),
        });
    }

    Ok((key.to_string(), parse_value(key, raw)?))
}

fn parse_value(key: &str, raw: &str) -> Result<Value, StateError> {
    if raw.trim().is_empty() {
        return Err(StateError::InvalidValue {
            key: key.to_string(),
            details: "empty value".to_string(),
        });
    }

    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}
