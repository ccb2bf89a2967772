//! Verify command.

use anyhow::Result;
use clap::Args;
use global_id::{ParseOptions, SignedGlobalId};

use crate::error::CliError;
use crate::output::{print_single, print_success, OutputFormat};

use super::sign::TokenView;
use super::CommandContext;

/// Verify a signed token and show the global id it carries.
#[derive(Debug, Args)]
pub struct VerifyCommand {
    /// Signed token.
    token: String,

    /// Purpose the token must have been signed for.
    #[arg(long = "for")]
    purpose: Option<String>,
}

impl VerifyCommand {
    fn options(&self) -> ParseOptions {
        match &self.purpose {
            Some(purpose) => ParseOptions::new().purpose(purpose.clone()),
            None => ParseOptions::new(),
        }
    }

    pub fn run(self, ctx: CommandContext) -> Result<()> {
        ctx.settings.require_secret()?;

        let sgid = SignedGlobalId::parse(&self.token, &self.options())
            .map_err(CliError::from)?
            .ok_or(CliError::Rejected)?;

        let view = TokenView::from(&sgid);
        print_single(&view, &view.rows(), ctx.format);
        if let OutputFormat::Table = ctx.format {
            print_success(&format!("token is valid for {}", sgid.global_id()));
        }
        Ok(())
    }
}
