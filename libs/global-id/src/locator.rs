//! Resolving identifiers back into records.
//!
//! A [`Locator`] keeps a registry of per-app [`Resolver`]s keyed by the
//! lower-cased app name. Identifiers for apps without a custom resolver go
//! through the [`DefaultResolver`], which looks the model type up in a
//! [`ModelRegistry`], applies the type filter, and calls the type's finder.
//!
//! Untrusted input resolves to `None`. The only lookup failure that is an
//! error by default is a missing record in a batch.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::error::GidError;
use crate::global_id::{GlobalId, Locatable};
use crate::model::{ModelClass, ModelRegistry, Record, TypeFilter};
use crate::signed::{ParseOptions, SignedLocatable};
use crate::uri::validate_app;
use crate::verifier::MessageVerifier;

static GLOBAL: OnceLock<Locator> = OnceLock::new();

/// The process-wide locator used by [`GlobalId::find`].
pub fn global() -> &'static Locator {
    GLOBAL.get_or_init(Locator::new)
}

/// Options shared by every `locate*` call.
#[derive(Debug, Clone, Default)]
pub struct LocateOptions {
    only: Option<TypeFilter>,
    ignore_missing: bool,
    purpose: Option<String>,
    verifier: Option<Arc<dyn MessageVerifier>>,
    now: Option<DateTime<Utc>>,
}

impl LocateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to the given types or capabilities.
    pub fn only(mut self, filter: impl Into<TypeFilter>) -> Self {
        self.only = Some(filter.into());
        self
    }

    /// Drops missing records from batch results instead of failing.
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    /// The purpose signed tokens must carry.
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Verifier for signed tokens, overriding the process-wide default.
    pub fn verifier(mut self, verifier: Arc<dyn MessageVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Checks token expiry as if the current time were `now`.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn type_filter(&self) -> Option<&TypeFilter> {
        self.only.as_ref()
    }

    pub fn ignores_missing(&self) -> bool {
        self.ignore_missing
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions::from_parts(self.purpose.clone(), self.verifier.clone(), self.now)
    }
}

/// Resolves identifiers for one app.
///
/// A custom resolver owns filtering: the `only` option is passed along but
/// not applied on its behalf.
pub trait Resolver: Send + Sync {
    fn locate(&self, gid: &GlobalId, options: &LocateOptions) -> Option<Record>;

    /// Resolves a batch, returning one slot per input in input order.
    ///
    /// `None` slots are dropped from the final result. The default calls
    /// `locate` per id and treats a miss as [`GidError::MissingRecord`]
    /// unless `ignore_missing` is set.
    fn locate_many(
        &self,
        gids: &[GlobalId],
        options: &LocateOptions,
    ) -> Result<Vec<Option<Record>>, GidError> {
        gids.iter()
            .map(|gid| match self.locate(gid, options) {
                Some(record) => Ok(Some(record)),
                None => missing(gid, options).map(|()| None),
            })
            .collect()
    }
}

fn missing(gid: &GlobalId, options: &LocateOptions) -> Result<(), GidError> {
    if options.ignore_missing {
        tracing::warn!(gid = %gid, "ignoring missing record in batch lookup");
        return Ok(());
    }
    Err(GidError::MissingRecord {
        model_name: gid.model_name().to_string(),
        model_id: gid.model_id().to_string(),
    })
}

impl<F> Resolver for F
where
    F: Fn(&GlobalId) -> Option<Record> + Send + Sync,
{
    fn locate(&self, gid: &GlobalId, _options: &LocateOptions) -> Option<Record> {
        self(gid)
    }
}

/// Resolves through registered model types.
#[derive(Debug, Clone)]
pub struct DefaultResolver {
    models: Arc<ModelRegistry>,
}

impl DefaultResolver {
    pub fn new(models: Arc<ModelRegistry>) -> Self {
        Self { models }
    }

    fn allowed(&self, gid: &GlobalId, options: &LocateOptions) -> bool {
        options
            .only
            .as_ref()
            .is_none_or(|filter| filter.matches(&self.models, gid.model_name()))
    }
}

impl Resolver for DefaultResolver {
    fn locate(&self, gid: &GlobalId, options: &LocateOptions) -> Option<Record> {
        if !self.allowed(gid, options) {
            tracing::debug!(gid = %gid, "global id filtered out by type restriction");
            return None;
        }

        let Some(class) = self.models.get(gid.model_name()) else {
            tracing::debug!(gid = %gid, "no model type registered for global id");
            return None;
        };

        class.finder().find(gid.model_id())
    }

    fn locate_many(
        &self,
        gids: &[GlobalId],
        options: &LocateOptions,
    ) -> Result<Vec<Option<Record>>, GidError> {
        let mut slots: Vec<Option<Record>> = vec![None; gids.len()];
        let mut groups: Vec<(Arc<ModelClass>, Vec<usize>)> = Vec::new();
        let mut group_index: HashMap<&str, usize> = HashMap::new();

        for (i, gid) in gids.iter().enumerate() {
            if !self.allowed(gid, options) {
                continue;
            }

            if let Some(&g) = group_index.get(gid.model_name()) {
                groups[g].1.push(i);
                continue;
            }

            match self.models.get(gid.model_name()) {
                Some(class) => {
                    group_index.insert(gid.model_name(), groups.len());
                    groups.push((class, vec![i]));
                }
                None => missing(gid, options)?,
            }
        }

        for (class, indices) in groups {
            let mut ids: Vec<&str> = Vec::with_capacity(indices.len());
            for &i in &indices {
                let id = gids[i].model_id();
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }

            tracing::debug!(model = class.name(), count = ids.len(), "batch fetching records");
            let found: HashMap<String, Record> = class
                .finder()
                .find_all(&ids)
                .into_iter()
                .map(|record| (record.id(), record))
                .collect();

            for i in indices {
                match found.get(gids[i].model_id()) {
                    Some(record) => slots[i] = Some(Arc::clone(record)),
                    None => missing(&gids[i], options)?,
                }
            }
        }

        Ok(slots)
    }
}

/// App-name to resolver registry plus the default resolution strategy.
pub struct Locator {
    resolvers: RwLock<HashMap<String, Arc<dyn Resolver>>>,
    models: Arc<ModelRegistry>,
    default: Arc<DefaultResolver>,
}

impl Locator {
    pub fn new() -> Self {
        Self::with_models(Arc::new(ModelRegistry::new()))
    }

    pub fn with_models(models: Arc<ModelRegistry>) -> Self {
        Self {
            resolvers: RwLock::new(HashMap::new()),
            default: Arc::new(DefaultResolver::new(Arc::clone(&models))),
            models,
        }
    }

    /// The model types the default resolver consults.
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Shorthand for `self.models().register(class)`.
    pub fn register_model(&self, class: ModelClass) {
        self.models.register(class);
    }

    /// Registers a resolver for `app`, replacing any previous one.
    ///
    /// The name is matched case-insensitively. Names containing underscores
    /// are rejected because no valid app name can contain one.
    pub fn register(&self, app: &str, resolver: impl Resolver + 'static) -> Result<(), GidError> {
        self.register_shared(app, Arc::new(resolver))
    }

    pub fn register_shared(&self, app: &str, resolver: Arc<dyn Resolver>) -> Result<(), GidError> {
        if app.contains('_') {
            return Err(GidError::InvalidLocatorName(app.to_string()));
        }
        validate_app(app)?;

        tracing::info!(app, "registering global id resolver");
        self.resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(app.to_lowercase(), resolver);
        Ok(())
    }

    /// Removes the resolver registered for `app`.
    pub fn unregister(&self, app: &str) -> Option<Arc<dyn Resolver>> {
        self.resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&app.to_lowercase())
    }

    fn resolver_for(&self, app: &str) -> Arc<dyn Resolver> {
        let resolvers = self.resolvers.read().unwrap_or_else(PoisonError::into_inner);
        match resolvers.get(&app.to_lowercase()) {
            Some(resolver) => Arc::clone(resolver),
            None => Arc::clone(&self.default) as Arc<dyn Resolver>,
        }
    }

    /// Resolves one identifier, given as a value, text, or param form.
    pub fn locate(&self, input: impl Locatable, options: &LocateOptions) -> Option<Record> {
        let Some(gid) = input.as_global_id() else {
            tracing::debug!("not a global id");
            return None;
        };
        self.resolver_for(gid.app()).locate(&gid, options)
    }

    /// Resolves many identifiers, preserving input order.
    ///
    /// Each app is resolved in one call; the default resolver then issues one
    /// batch fetch per model type. Inputs that don't parse and records
    /// excluded by `only` are dropped. A record that can't be found fails the
    /// whole call unless `ignore_missing` is set.
    pub fn locate_many<I>(&self, inputs: I, options: &LocateOptions) -> Result<Vec<Record>, GidError>
    where
        I: IntoIterator,
        I::Item: Locatable,
    {
        let gids: Vec<GlobalId> = inputs
            .into_iter()
            .filter_map(|input| input.as_global_id().map(|gid| gid.into_owned()))
            .collect();

        self.locate_gids(gids, options)
    }

    /// Verifies a signed token, then resolves it.
    ///
    /// Tokens that fail verification resolve to `None`. Fails only when no
    /// verifier is available.
    pub fn locate_signed(
        &self,
        input: impl SignedLocatable,
        options: &LocateOptions,
    ) -> Result<Option<Record>, GidError> {
        Ok(input
            .verify_signed(&options.parse_options())?
            .and_then(|sgid| self.locate(sgid.global_id(), options)))
    }

    /// Verifies each token independently, then resolves the survivors as a
    /// batch. Tokens that fail verification are dropped.
    pub fn locate_many_signed<I>(
        &self,
        inputs: I,
        options: &LocateOptions,
    ) -> Result<Vec<Record>, GidError>
    where
        I: IntoIterator,
        I::Item: SignedLocatable,
    {
        let parse_options = options.parse_options();
        let mut gids = Vec::new();
        for input in inputs {
            if let Some(sgid) = input.verify_signed(&parse_options)? {
                gids.push(sgid.global_id().clone());
            }
        }

        self.locate_gids(gids, options)
    }

    fn locate_gids(&self, gids: Vec<GlobalId>, options: &LocateOptions) -> Result<Vec<Record>, GidError> {
        let mut slots: Vec<Option<Record>> = vec![None; gids.len()];
        let mut by_app: Vec<(String, Vec<usize>)> = Vec::new();

        for (i, gid) in gids.iter().enumerate() {
            let key = gid.app().to_lowercase();
            match by_app.iter_mut().find(|(app, _)| *app == key) {
                Some((_, indices)) => indices.push(i),
                None => by_app.push((key, vec![i])),
            }
        }

        for (app, indices) in by_app {
            let batch: Vec<GlobalId> = indices.iter().map(|&i| gids[i].clone()).collect();
            let found = self.resolver_for(&app).locate_many(&batch, options)?;
            for (i, record) in indices.into_iter().zip(found) {
                slots[i] = record;
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolvers = self.resolvers.read().unwrap_or_else(PoisonError::into_inner);
        let mut apps: Vec<&String> = resolvers.keys().collect();
        apps.sort();
        f.debug_struct("Locator")
            .field("apps", &apps)
            .field("models", &self.models)
            .finish()
    }
}
