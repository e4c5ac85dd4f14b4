//! Template resolution for unregistered environments.
//!
//! # Responsibilities
//! - Turn the template entry into a value for a concrete environment key
//! - Keep synthesis a pure function of `(key, template)`
//!
//! # Design Decisions
//! - Resolvers are pluggable: any `Fn(&str, &T) -> Result<T, EnvironmentError>`
//! - The shipped resolver round-trips through JSON and substitutes a literal
//!   placeholder, so every string field of the template is covered
//! - Placeholder and replacement are JSON-escaped before substitution; a key
//!   can only change the text of placeholder-bearing strings, never the
//!   document structure

use serde::{de::DeserializeOwned, Serialize};

use crate::registry::EnvironmentError;

/// Placeholder replaced by the silo number in template values.
pub const SILO_PLACEHOLDER: &str = "XXX";

/// Produces the value for `key` from the template value.
pub trait TemplateResolver<T>: Send + Sync {
    fn resolve(&self, key: &str, template: &T) -> Result<T, EnvironmentError>;
}

impl<T, F> TemplateResolver<T> for F
where
    F: Fn(&str, &T) -> Result<T, EnvironmentError> + Send + Sync,
{
    fn resolve(&self, key: &str, template: &T) -> Result<T, EnvironmentError> {
        self(key, template)
    }
}

/// Resolver for `S<silo number>` style environment names.
///
/// Given the template
///
/// ```toml
/// [environments.template]
/// template = true
/// database_url = "jdbc:sqlserver://a1-dba-XXX.a1.example.com;database=PROD"
/// ```
///
/// a lookup of `S999` yields `a1-dba-999.a1.example.com`.
#[derive(Debug, Clone)]
pub struct SiloTemplateResolver {
    placeholder: String,
    prefix_len: usize,
}

impl SiloTemplateResolver {
    /// Resolver using the `XXX` placeholder and a one character key prefix.
    pub fn new() -> Self {
        Self {
            placeholder: SILO_PLACEHOLDER.to_string(),
            prefix_len: 1,
        }
    }

    /// Replace a different placeholder token.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Strip `prefix_len` leading characters from the key to get the replacement.
    pub fn with_prefix_len(mut self, prefix_len: usize) -> Self {
        self.prefix_len = prefix_len;
        self
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// The text substituted for the placeholder when resolving `key`.
    pub fn replacement<'a>(&self, key: &'a str) -> &'a str {
        match key.char_indices().nth(self.prefix_len) {
            Some((idx, _)) => &key[idx..],
            None => "",
        }
    }
}

impl Default for SiloTemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TemplateResolver<T> for SiloTemplateResolver
where
    T: Serialize + DeserializeOwned,
{
    fn resolve(&self, key: &str, template: &T) -> Result<T, EnvironmentError> {
        let fault = |e: serde_json::Error| EnvironmentError::template_resolution(key, e);
        let json = serde_json::to_string(template).map_err(fault)?;
        let placeholder = json_escaped(&self.placeholder).map_err(fault)?;
        let replacement = json_escaped(self.replacement(key)).map_err(fault)?;
        let json = json.replace(&placeholder, &replacement);
        serde_json::from_str(&json).map_err(fault)
    }
}

/// `text` as it appears inside a JSON string literal.
fn json_escaped(text: &str) -> Result<String, serde_json::Error> {
    let quoted = serde_json::to_string(text)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}
