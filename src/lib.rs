//! Meteo - shared state synchronization for the weather display client.
//!
//! UI components share a handful of values (selected city, language, unit
//! system, theme) without being wired to one another. The main pieces are:
//!
//! - A keyed store of slot values with change detection
//! - A per-topic observer registry
//! - A dispatcher that runs every observer as its own task
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use meteo::{config::Config, state::{ObserverRef, StateManager, keys}};
//! use serde_json::json;
//!
//! # async fn run() -> meteo::Result<()> {
//! let state = StateManager::from_config(&Config::default())?;
//!
//! let header = ObserverRef::from_fn("header", |event| {
//!     println!("city changed: {event:?}");
//! });
//! state.register_observer(keys::CITY, &header);
//!
//! state.set_state(keys::CITY, json!("Paris"), true).await;
//! state.shutdown().await;
//! # Ok(())
//! # }
//! ```

/// Configuration schema definitions and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Keyed state store, observer registry and dispatcher.
pub mod state;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use crate::core::{MeteoError, Result};
