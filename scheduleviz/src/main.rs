//! # scheduleviz
//!
//! Entry point for the scheduleviz binary.

use anyhow::{Context, Result};
use clap::Parser;
use scheduleviz::{app, config::Config};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let saved = app::run(&config)?;
    tracing::debug!("output written to {}", saved.display());

    if config.pause {
        wait_for_enter()?;
    }
    Ok(())
}

fn wait_for_enter() -> Result<()> {
    print!("Finished. Press enter to terminate...");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("failed to read stdin")?;
    Ok(())
}
