//! CLI commands.

mod decode;
mod encode;
mod sign;
mod verify;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::logging;
use crate::output::OutputFormat;

/// gid - Encode, decode, sign, and verify global ids.
#[derive(Debug, Parser)]
#[command(name = "gid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Default app name for new ids.
    #[arg(long, global = true, env = "GID_APP")]
    app: Option<String>,

    /// Secret used to sign and verify tokens.
    #[arg(long, global = true, env = "GID_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Default token lifetime in seconds.
    #[arg(long, global = true, env = "GID_EXPIRES_IN")]
    expires_in: Option<i64>,

    /// Log filter (e.g. debug, global_id=trace). RUST_LOG wins when set.
    #[arg(long, global = true, env = "GID_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a gid:// URI for a model.
    Encode(encode::EncodeCommand),

    /// Show the components of a gid:// URI or param.
    Decode(decode::DecodeCommand),

    /// Sign a global id into a token.
    Sign(sign::SignCommand),

    /// Verify a signed token.
    Verify(verify::VerifyCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub fn run(self) -> Result<()> {
        logging::init(self.log_level.as_deref());

        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        let settings = Settings {
            app: self.app,
            secret: self.secret,
            expires_in: self.expires_in,
        };
        settings.install()?;

        let ctx = CommandContext { settings, format };

        match self.command {
            Commands::Encode(cmd) => cmd.run(ctx),
            Commands::Decode(cmd) => cmd.run(ctx),
            Commands::Sign(cmd) => cmd.run(ctx),
            Commands::Verify(cmd) => cmd.run(ctx),
            Commands::Version => {
                println!("gid {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub settings: Settings,
    pub format: OutputFormat,
}
