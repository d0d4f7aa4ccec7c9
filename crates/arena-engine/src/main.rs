//! # Arena Engine
//!
//! Headless match runner for Project Arena.
//!
//! Ties the combat core to the ambient stack:
//! - Tracing subscriber setup
//! - Tuning loaded from `arena.toml` (or the path given as first argument)
//! - Built-in two-fighter roster
//! - Scripted demo match with the result printed as JSON

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod pilot;
mod roster;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use arena_combat::config::CONFIG_FILE;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("arena=info".parse()?))
        .init();

    info!("Project Arena starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);

    let result = app::run(&config_path)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    info!("Project Arena shutdown complete");
    Ok(())
}
