//! Process-wide defaults.
//!
//! The default app name, verifier, and expiration are written rarely
//! (usually once at startup) and read on every operation. Per-call options
//! always take precedence over these values.
//!
//! Tests that swap configuration should hold a [`ConfigGuard`] from
//! [`scoped`], which restores the previous configuration when dropped.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use chrono::Duration;

use crate::error::GidError;
use crate::uri::validate_app;
use crate::verifier::MessageVerifier;

static CONFIG: OnceLock<RwLock<GlobalIdConfig>> = OnceLock::new();

/// Defaults applied when an operation doesn't specify its own.
#[derive(Debug, Clone, Default)]
pub struct GlobalIdConfig {
    app: Option<String>,
    verifier: Option<Arc<dyn MessageVerifier>>,
    expires_in: Option<Duration>,
}

impl GlobalIdConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default app name after validating it.
    pub fn with_app(mut self, app: &str) -> Result<Self, GidError> {
        self.app = Some(validate_app(app)?.to_string());
        Ok(self)
    }

    pub fn with_verifier(self, verifier: impl MessageVerifier + 'static) -> Self {
        self.with_shared_verifier(Arc::new(verifier))
    }

    pub fn with_shared_verifier(mut self, verifier: Arc<dyn MessageVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Sets the relative expiration applied to signed identifiers that don't
    /// choose their own.
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    pub fn verifier(&self) -> Option<&Arc<dyn MessageVerifier>> {
        self.verifier.as_ref()
    }

    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }
}

fn cell() -> &'static RwLock<GlobalIdConfig> {
    CONFIG.get_or_init(|| RwLock::new(GlobalIdConfig::default()))
}

fn update<R>(f: impl FnOnce(&mut GlobalIdConfig) -> R) -> R {
    let mut config = cell().write().unwrap_or_else(PoisonError::into_inner);
    f(&mut config)
}

/// Returns a snapshot of the process-wide configuration.
pub fn current() -> GlobalIdConfig {
    cell()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the process-wide configuration, returning the previous one.
pub fn install(config: GlobalIdConfig) -> GlobalIdConfig {
    tracing::info!(
        app = config.app(),
        has_verifier = config.verifier.is_some(),
        expires_in_secs = config.expires_in.map(|d| d.num_seconds()),
        "installing global id configuration"
    );
    update(|current| std::mem::replace(current, config))
}

/// Sets the default app name.
pub fn set_app(app: &str) -> Result<(), GidError> {
    let app = validate_app(app)?.to_string();
    update(|config| config.app = Some(app));
    Ok(())
}

/// Sets or clears the default verifier.
pub fn set_verifier(verifier: Option<Arc<dyn MessageVerifier>>) {
    update(|config| config.verifier = verifier);
}

/// Sets or clears the default relative expiration.
pub fn set_expires_in(expires_in: Option<Duration>) {
    update(|config| config.expires_in = expires_in);
}

/// Installs `config` until the returned guard is dropped.
#[must_use = "the previous configuration is restored when the guard is dropped"]
pub fn scoped(config: GlobalIdConfig) -> ConfigGuard {
    ConfigGuard {
        previous: Some(install(config)),
    }
}

/// Restores the configuration that was active before [`scoped`] was called.
#[derive(Debug)]
pub struct ConfigGuard {
    previous: Option<GlobalIdConfig>,
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            update(|config| *config = previous);
        }
    }
}
