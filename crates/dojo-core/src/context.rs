//! Execution Context: configuration assembled once per run
//!
//! A run builds two contexts: the auth context from an env-style file and the
//! bootstrap context from a YAML document. Both are plain ordered mappings and
//! are never mutated after construction.
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::coerce::coerce_bool;
use crate::error::{BootstrapError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// External variable name → internal context key.
pub type VarsMap = Vec<(String, String)>;

/// The closed set of context builders.
#[derive(Debug, Clone)]
pub enum ContextSource {
    /// Placeholder that always fails, so callers must pick a real source.
    None,
    /// `KEY=VALUE` file. Only keys listed in `vars_map` are kept, renamed.
    /// With `overlay_env`, variables already set in the process environment
    /// take precedence over the file.
    EnvFile {
        path: PathBuf,
        vars_map: VarsMap,
        overlay_env: bool,
    },
    /// YAML document whose root is a mapping.
    YamlFile { path: PathBuf },
}

impl ContextSource {
    pub fn yaml_file(path: impl Into<PathBuf>) -> Self {
        Self::YamlFile { path: path.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "from_none",
            Self::EnvFile { .. } => "from_dotenv_file",
            Self::YamlFile { .. } => "from_yaml_file",
        }
    }
}

/// Build a context from the selected source.
///
/// File sources never fail: a missing or malformed file is logged and yields
/// an empty context. Callers validate the keys they require.
pub fn create_context(source: &ContextSource) -> Result<Context> {
    debug!(builder = source.name(), "Returning context from context builder");

    match source {
        ContextSource::None => {
            error!("You are using the empty context builder, which will fail");
            Err(BootstrapError::NotImplemented(source.name().to_string()))
        }
        ContextSource::EnvFile {
            path,
            vars_map,
            overlay_env,
        } => Ok(try_from_env_file(path, vars_map, *overlay_env)
            .unwrap_or_else(|e| empty_on_failure(path, e))),
        ContextSource::YamlFile { path } => {
            Ok(try_from_yaml_file(path).unwrap_or_else(|e| empty_on_failure(path, e)))
        }
    }
}

fn empty_on_failure(path: &Path, err: BootstrapError) -> Context {
    error!(path = %path.display(), "Failed to load context, set DEBUG for details");
    debug!(error = ?err, "Context builder failure");
    Context::new()
}

/// Strict env-file builder: same mapping as [`ContextSource::EnvFile`] but the
/// failure reason is returned instead of an empty context.
pub fn try_from_env_file(path: &Path, vars_map: &VarsMap, overlay_env: bool) -> Result<Context> {
    let mut file_vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        file_vars.insert(key, value);
    }

    let mut values = Map::new();
    for (external, internal) in vars_map {
        let from_env = if overlay_env {
            std::env::var(external).ok()
        } else {
            None
        };
        if let Some(raw) = from_env.or_else(|| file_vars.get(external).cloned()) {
            values.insert(internal.clone(), coerce_bool(Value::String(raw)));
        }
    }

    Ok(Context::from_map(values))
}

/// Strict YAML builder.
pub fn try_from_yaml_file(path: &Path) -> Result<Context> {
    let contents = std::fs::read_to_string(path)?;
    let document: Value = serde_yaml::from_str(&contents)?;
    debug!(document = %document, "Parsed bootstrap document");

    match document {
        Value::Object(map) => Ok(Context::from_map(map)),
        other => Err(BootstrapError::InvalidConfig(format!(
            "expected a mapping at the root of '{}', found {}",
            path.display(),
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "an empty document",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
