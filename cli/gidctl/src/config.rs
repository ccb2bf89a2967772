//! Settings gathered from flags and environment.
//!
//! Handles:
//! - Default app name
//! - Signing secret
//! - Default token lifetime

use anyhow::{Context, Result};
use chrono::Duration;
use global_id::{config, GlobalIdConfig, HmacVerifier};

use crate::error::CliError;

/// CLI settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Default app name.
    pub app: Option<String>,

    /// Signing secret.
    pub secret: Option<String>,

    /// Default token lifetime in seconds.
    pub expires_in: Option<i64>,
}

impl Settings {
    /// Convert into a library configuration.
    pub fn to_config(&self) -> Result<GlobalIdConfig> {
        let mut cfg = GlobalIdConfig::new();

        if let Some(app) = &self.app {
            cfg = cfg
                .with_app(app)
                .with_context(|| format!("invalid GID_APP '{app}'"))?;
        }

        if let Some(secret) = &self.secret {
            cfg = cfg.with_verifier(HmacVerifier::new(secret));
        }

        if let Some(secs) = self.expires_in {
            cfg = cfg.with_expires_in(lifetime("GID_EXPIRES_IN", secs)?);
        }

        Ok(cfg)
    }

    /// Install as the process-wide configuration.
    pub fn install(&self) -> Result<()> {
        config::install(self.to_config()?);
        Ok(())
    }

    /// Require an app to be specified.
    pub fn require_app(&self) -> Result<&str> {
        self.app.as_deref().ok_or_else(|| CliError::MissingApp.into())
    }

    /// Require a secret to be specified.
    pub fn require_secret(&self) -> Result<()> {
        match self.secret {
            Some(_) => Ok(()),
            None => Err(CliError::MissingSecret.into()),
        }
    }
}

/// Convert a positive number of seconds into a token lifetime.
pub fn lifetime(name: &str, secs: i64) -> Result<Duration> {
    if secs <= 0 {
        anyhow::bail!("{name} must be a positive number of seconds, got {secs}");
    }
    Duration::try_seconds(secs)
        .with_context(|| format!("{name} is too large: {secs} seconds"))
}

/// Parse a `key=value` pair.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=value: no '=' found in '{s}'"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=value: empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_config() {
        let settings = Settings {
            app: Some("bcx".into()),
            secret: Some("secret".into()),
            expires_in: Some(3600),
        };
        let cfg = settings.to_config().unwrap();
        assert_eq!(cfg.app(), Some("bcx"));
        assert!(cfg.verifier().is_some());
        assert_eq!(cfg.expires_in(), Some(Duration::hours(1)));
    }

    #[test]
    fn test_invalid_app_rejected() {
        let settings = Settings {
            app: Some("blog_app".into()),
            ..Default::default()
        };
        let err = settings.to_config().unwrap_err();
        assert!(err.to_string().contains("GID_APP"));
    }

    #[test]
    fn test_non_positive_expiry_rejected() {
        let settings = Settings {
            expires_in: Some(0),
            ..Default::default()
        };
        assert!(settings.to_config().is_err());
    }

    #[test]
    fn test_lifetime_bounds() {
        assert_eq!(lifetime("--ttl", 60).unwrap(), Duration::minutes(1));
        assert!(lifetime("--ttl", -5).is_err());
        let err = lifetime("GID_EXPIRES_IN", i64::MAX).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_require_values() {
        let settings = Settings::default();
        assert!(settings.require_app().is_err());
        assert!(settings.require_secret().is_err());
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("hello=world").unwrap(),
            ("hello".to_string(), "world".to_string())
        );
        assert_eq!(
            parse_key_val("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }
}
