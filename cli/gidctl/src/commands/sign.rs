//! Sign command.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use global_id::{GlobalId, SignOptions, SignedGlobalId};
use serde::Serialize;

use crate::config::lifetime;
use crate::error::CliError;
use crate::output::{print_single, FieldRow};

use super::CommandContext;

/// Sign a global id into a tamper-evident token.
#[derive(Debug, Args)]
pub struct SignCommand {
    /// gid:// URI or base64 param.
    input: String,

    /// Purpose the token is valid for.
    #[arg(long = "for")]
    purpose: Option<String>,

    /// Token lifetime in seconds (overrides GID_EXPIRES_IN).
    #[arg(long, conflicts_with = "expires_at")]
    ttl: Option<i64>,

    /// Absolute expiry as an RFC 3339 timestamp.
    #[arg(long)]
    expires_at: Option<DateTime<Utc>>,

    /// Issue a token that never expires.
    #[arg(long, conflicts_with_all = ["ttl", "expires_at"])]
    no_expiry: bool,
}

/// A signed token as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct TokenView {
    pub token: String,
    pub gid: String,
    pub purpose: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&SignedGlobalId> for TokenView {
    fn from(sgid: &SignedGlobalId) -> Self {
        Self {
            token: sgid.to_text().to_string(),
            gid: sgid.global_id().to_string(),
            purpose: sgid.purpose().to_string(),
            expires_at: sgid.expires_at(),
        }
    }
}

impl TokenView {
    pub fn rows(&self) -> Vec<FieldRow> {
        vec![
            FieldRow::new("token", &self.token),
            FieldRow::new("gid", &self.gid),
            FieldRow::new("purpose", &self.purpose),
            FieldRow::new(
                "expires_at",
                self.expires_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
            ),
        ]
    }
}

impl SignCommand {
    fn options(&self) -> Result<SignOptions> {
        let mut options = SignOptions::new();
        if let Some(purpose) = &self.purpose {
            options = options.purpose(purpose.clone());
        }
        if let Some(secs) = self.ttl {
            options = options.expires_in(lifetime("--ttl", secs)?);
        }
        if let Some(at) = self.expires_at {
            options = options.expires_at(at);
        }
        if self.no_expiry {
            options = options.expires_at(None);
        }
        Ok(options)
    }

    pub fn run(self, ctx: CommandContext) -> Result<()> {
        ctx.settings.require_secret()?;

        let gid = GlobalId::parse(&self.input)
            .ok_or_else(|| CliError::NotAGlobalId(self.input.clone()))?;
        let sgid = SignedGlobalId::new(gid, &self.options()?).map_err(CliError::from)?;

        let view = TokenView::from(&sgid);
        print_single(&view, &view.rows(), ctx.format);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use global_id::{HmacVerifier, ParseOptions};
    use std::sync::Arc;

    fn command(purpose: Option<&str>, ttl: Option<i64>, no_expiry: bool) -> SignCommand {
        SignCommand {
            input: "gid://bcx/Person/5".into(),
            purpose: purpose.map(str::to_string),
            ttl,
            expires_at: None,
            no_expiry,
        }
    }

    fn sign(cmd: &SignCommand, now: DateTime<Utc>) -> SignedGlobalId {
        let gid = GlobalId::parse(&cmd.input).unwrap();
        let options = cmd
            .options()
            .unwrap()
            .verifier(Arc::new(HmacVerifier::new("secret")))
            .at(now);
        SignedGlobalId::new(gid, &options).unwrap()
    }

    #[test]
    fn test_options_carry_purpose_and_lifetime() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let sgid = sign(&command(Some("login"), Some(60), false), now);
        assert_eq!(sgid.purpose(), "login");
        assert_eq!(sgid.expires_at(), Some(now + Duration::seconds(60)));

        let options = ParseOptions::new()
            .purpose("login")
            .verifier(Arc::new(HmacVerifier::new("secret")))
            .at(now);
        assert!(SignedGlobalId::parse(sgid.to_text(), &options).unwrap().is_some());
    }

    #[test]
    fn test_no_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let sgid = sign(&command(None, None, true), now);
        assert!(sgid.expires_at().is_none());
        assert_eq!(TokenView::from(&sgid).rows()[3].value, "never");
    }
}
