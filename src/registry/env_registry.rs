//! Environment-aware configuration registry.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::registry::{
    Conflict, EntryMarkers, EnvironmentError, EnvironmentMarkers, TemplateResolver,
};

/// Function that creates the value for an environment that has no entry.
pub type CreationFunction<T> = Arc<dyn Fn(&str) -> T + Send + Sync>;

/// How a registry answers a lookup for a key it doesn't hold.
pub enum Synthesis<T> {
    /// Fail with `UnknownEnvironment` (unless a creation function is set).
    Eager,
    /// Resolve the template entry for the missing key and cache the result.
    Template(Arc<dyn TemplateResolver<T>>),
}

impl<T> Clone for Synthesis<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Eager => Self::Eager,
            Self::Template(resolver) => Self::Template(Arc::clone(resolver)),
        }
    }
}

impl<T> fmt::Debug for Synthesis<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager => f.write_str("Eager"),
            Self::Template(_) => f.write_str("Template"),
        }
    }
}

/// Mapping from environment key to configuration, with at most one default
/// entry and at most one template entry.
///
/// Lookups for unregistered keys are answered by the creation function if one
/// is set, otherwise (for template-backed registries) by resolving the
/// template entry. Every synthesized value is cached under its key.
///
/// ## Example
///
/// ```
/// use multienv::registry::{EntryMarkers, EnvRegistry, SiloTemplateResolver};
///
/// let registry = EnvRegistry::with_resolver(SiloTemplateResolver::new());
/// registry.put_with_markers("S115", "silo115-guest".to_string(), EntryMarkers::DEFAULT)?;
/// registry.put_with_markers("template", "siloXXX-guest".to_string(), EntryMarkers::TEMPLATE)?;
///
/// assert_eq!(*registry.get(Some("S116"))?, "silo116-guest");
/// assert_eq!(*registry.get(None)?, "silo115-guest");
/// # Ok::<(), multienv::registry::EnvironmentError>(())
/// ```
pub struct EnvRegistry<T> {
    entries: DashMap<String, Arc<T>>,
    default_key: ArcSwapOption<String>,
    template_key: ArcSwapOption<String>,
    creation: Option<CreationFunction<T>>,
    synthesis: Synthesis<T>,
}

impl<T> EnvRegistry<T> {
    /// Create an empty registry that fails on unknown keys.
    pub fn new() -> Self {
        Self::with_synthesis(Synthesis::Eager)
    }

    /// Create an empty registry that synthesizes unknown keys from its template.
    pub fn with_resolver<R>(resolver: R) -> Self
    where
        R: TemplateResolver<T> + 'static,
    {
        Self::with_synthesis(Synthesis::Template(Arc::new(resolver)))
    }

    pub fn with_synthesis(synthesis: Synthesis<T>) -> Self {
        Self {
            entries: DashMap::new(),
            default_key: ArcSwapOption::empty(),
            template_key: ArcSwapOption::empty(),
            creation: None,
            synthesis,
        }
    }

    /// Set the function used to create values for unregistered keys.
    ///
    /// The creation function takes precedence over the template.
    pub fn with_creation_function<F>(mut self, func: F) -> Self
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        self.set_creation_function(func);
        self
    }

    pub fn set_creation_function<F>(&mut self, func: F)
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        self.creation = Some(Arc::new(func));
    }

    /// Whether lookups of unknown keys resolve the template.
    pub fn is_template_backed(&self) -> bool {
        matches!(self.synthesis, Synthesis::Template(_))
    }

    /// Store `value` under `key` with explicit markers.
    ///
    /// Fails if the key is blank, if a second default or template is declared,
    /// or if the entry is marked both default and template. Nothing is stored
    /// on failure.
    pub fn put_with_markers(
        &self,
        key: &str,
        value: T,
        markers: EntryMarkers,
    ) -> Result<Option<Arc<T>>, EnvironmentError> {
        if key.trim().is_empty() {
            return Err(Conflict::BlankKey {
                key: key.to_string(),
            }
            .into());
        }
        if markers.default && markers.template {
            return Err(Conflict::DefaultAndTemplate {
                key: key.to_string(),
            }
            .into());
        }

        // Markers are claimed under the entry's shard lock, so a reader never
        // sees a designated key without its value.
        let entry = self.entries.entry(key.to_string());
        if markers.default {
            claim(&self.default_key, key).map_err(|existing| Conflict::DuplicateDefault {
                key: key.to_string(),
                existing,
            })?;
            tracing::info!(environment = %key, "Registered default environment");
        }
        if markers.template {
            claim(&self.template_key, key).map_err(|existing| Conflict::DuplicateTemplate {
                key: key.to_string(),
                existing,
            })?;
            tracing::info!(environment = %key, "Registered template environment");
        }

        let value = Arc::new(value);
        Ok(match entry {
            Entry::Occupied(mut occupied) => Some(occupied.insert(value)),
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                None
            }
        })
    }

    /// Resolve `key` to a stored or synthesized value.
    ///
    /// A blank or absent key selects the default environment. Matching is
    /// exact and case-sensitive.
    pub fn get(&self, key: Option<&str>) -> Result<Arc<T>, EnvironmentError> {
        let key = self.selected_key(key)?;
        if let Some(found) = self.entries.get(key.as_str()) {
            return Ok(Arc::clone(found.value()));
        }

        let synthesized = self.synthesize(&key)?;
        // First insert wins; racing callers all get the cached value.
        let cached = self.entries.entry(key).or_insert(synthesized);
        Ok(Arc::clone(cached.value()))
    }

    /// The value of the default environment.
    pub fn get_default(&self) -> Result<Arc<T>, EnvironmentError> {
        let key = self.default_key()?;
        self.get(Some(&key))
    }

    /// The key a lookup of `key` would be answered from.
    ///
    /// Missing keys map to themselves when a creation function will produce
    /// them, or to the template key when the template will be resolved.
    pub fn get_key_or_default(&self, key: Option<&str>) -> Result<String, EnvironmentError> {
        let key = self.selected_key(key)?;
        if self.entries.contains_key(key.as_str()) || self.creation.is_some() {
            return Ok(key);
        }
        if self.is_template_backed() {
            if let Some(template) = self.template_key.load_full() {
                return Ok(String::clone(&template));
            }
        }
        tracing::error!(environment = %key, known = ?self.keys(), "Failed to find environment");
        Err(EnvironmentError::UnknownEnvironment { key })
    }

    pub fn default_key(&self) -> Result<String, EnvironmentError> {
        self.default_key
            .load_full()
            .map(|key| String::clone(&key))
            .ok_or(EnvironmentError::NoDefaultConfigured)
    }

    pub fn template_key(&self) -> Result<String, EnvironmentError> {
        self.template_key
            .load_full()
            .map(|key| String::clone(&key))
            .ok_or(EnvironmentError::NoTemplateConfigured)
    }

    /// The template value, if a template environment is configured.
    pub fn template(&self) -> Option<Arc<T>> {
        let key = self.template_key.load_full()?;
        self.entries.get(key.as_str()).map(|r| Arc::clone(r.value()))
    }

    pub fn has_default_environment(&self) -> bool {
        self.default_key.load().is_some()
    }

    pub fn has_template_environment(&self) -> bool {
        self.template_key.load().is_some()
    }

    /// Whether `key` has an entry (stored or previously synthesized).
    pub fn contains_key(&self, key: Option<&str>) -> bool {
        key.is_some_and(|k| self.entries.contains_key(k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted snapshot of the keys currently held.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|r| r.key().clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Snapshot of all entries, sorted by key.
    pub fn entries(&self) -> Vec<(String, Arc<T>)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Remove the entry for `key`, releasing its default/template designation.
    pub fn remove(&self, key: &str) -> Option<Arc<T>> {
        let (_, value) = self.entries.remove(key)?;
        release(&self.default_key, key);
        release(&self.template_key, key);
        Some(value)
    }

    /// Derive a registry of another value type.
    ///
    /// The default and template keys are copied as-is. The result is eager.
    pub fn convert<R, F>(&self, func: F) -> EnvRegistry<R>
    where
        F: Fn(&str, &T) -> R,
    {
        self.convert_with(func, None)
    }

    /// Derive a registry of another value type with template resolution.
    ///
    /// The result is template-backed when this registry has a template
    /// environment and `resolver` is given.
    pub fn convert_with<R, F>(
        &self,
        func: F,
        resolver: Option<Arc<dyn TemplateResolver<R>>>,
    ) -> EnvRegistry<R>
    where
        F: Fn(&str, &T) -> R,
    {
        let synthesis = match resolver {
            Some(resolver) if self.has_template_environment() => Synthesis::Template(resolver),
            _ => Synthesis::Eager,
        };
        let result = EnvRegistry::with_synthesis(synthesis);
        // `func` runs on a snapshot; it may call back into this registry.
        for (key, value) in self.entries() {
            let converted = func(&key, &value);
            result.entries.insert(key, Arc::new(converted));
        }
        result.default_key.store(self.default_key.load_full());
        result.template_key.store(self.template_key.load_full());
        result
    }

    fn selected_key(&self, key: Option<&str>) -> Result<String, EnvironmentError> {
        match key {
            Some(key) if !key.trim().is_empty() => Ok(key.to_string()),
            _ => self
                .default_key
                .load_full()
                .map(|key| String::clone(&key))
                .ok_or(EnvironmentError::MissingEnvironment),
        }
    }

    fn synthesize(&self, key: &str) -> Result<Arc<T>, EnvironmentError> {
        if let Some(create) = &self.creation {
            tracing::debug!(environment = %key, "Creating environment configuration");
            return Ok(Arc::new(create(key)));
        }

        if let Synthesis::Template(resolver) = &self.synthesis {
            if let Some(template) = self.template() {
                tracing::debug!(environment = %key, "Resolving environment from template");
                return resolver.resolve(key, &template).map(Arc::new);
            }
        }

        tracing::error!(environment = %key, known = ?self.keys(), "Failed to find environment");
        Err(EnvironmentError::UnknownEnvironment {
            key: key.to_string(),
        })
    }
}

impl<T: EnvironmentMarkers> EnvRegistry<T> {
    /// Store `value` under `key`, reading its markers from the value.
    pub fn put(&self, key: &str, value: T) -> Result<Option<Arc<T>>, EnvironmentError> {
        let markers = EntryMarkers::of(&value);
        self.put_with_markers(key, value, markers)
    }
}

impl<T> Default for EnvRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EnvRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            default_key: ArcSwapOption::new(self.default_key.load_full()),
            template_key: ArcSwapOption::new(self.template_key.load_full()),
            creation: self.creation.clone(),
            synthesis: self.synthesis.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for EnvRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvRegistry")
            .field("entries", &self.entries())
            .field("default_key", &self.default_key.load_full())
            .field("template_key", &self.template_key.load_full())
            .field("creation", &self.creation.is_some())
            .field("synthesis", &self.synthesis)
            .finish()
    }
}

/// Atomically designate `key`, returning the current holder on conflict.
fn claim(slot: &ArcSwapOption<String>, key: &str) -> Result<(), String> {
    let previous = slot.compare_and_swap(&None::<Arc<String>>, Some(Arc::new(key.to_string())));
    match &*previous {
        Some(existing) => Err(String::clone(existing)),
        None => Ok(()),
    }
}

fn release(slot: &ArcSwapOption<String>, key: &str) {
    let current = slot.load_full();
    if current.as_deref().is_some_and(|held| held == key) {
        let _ = slot.compare_and_swap(&current, None::<Arc<String>>);
    }
}
