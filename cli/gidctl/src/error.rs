//! Error handling and display for the CLI.

use colored::Colorize;
use global_id::GidError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No app specified. Use --app or set GID_APP.")]
    MissingApp,

    #[error("No signing secret specified. Use --secret or set GID_SECRET.")]
    MissingSecret,

    #[error("Not a global id: {0}")]
    NotAGlobalId(String),

    #[error("Token rejected: forged, expired, or signed for another purpose")]
    Rejected,

    #[error(transparent)]
    Library(#[from] GidError),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::NotAGlobalId(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: expected gid://app/Model/id or its base64 param form.".yellow()
                );
            }
            CliError::Rejected => {
                eprintln!(
                    "\n{}",
                    "Hint: check GID_SECRET and the --for purpose used when signing.".yellow()
                );
            }
            CliError::Library(GidError::InvalidApp { .. }) => {
                eprintln!(
                    "\n{}",
                    "Hint: app names may only contain letters, digits, and hyphens.".yellow()
                );
            }
            _ => {}
        }
    }
}
