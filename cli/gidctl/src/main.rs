//! gidctl (gid) - CLI for global ids
//!
//! Encodes model references as `gid://` URIs, decodes URIs and param forms,
//! and signs or verifies tokens with a shared secret.

use anyhow::Result;
use clap::Parser;

mod commands;
mod config;
mod error;
mod logging;
mod output;

use commands::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run() {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
