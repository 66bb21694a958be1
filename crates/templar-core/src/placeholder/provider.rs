//! Provider values, tables and the resolution context passed to computed providers.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, TemplarError};
use crate::meta::TemplateMeta;

/// Signature of a computed provider.
pub type ComputeFn = dyn Fn(&ResolutionContext) -> Option<Value> + Send + Sync;

/// Replacement value for a token: either fixed, or computed from the context.
#[derive(Clone)]
pub enum ProviderValue {
    Literal(Value),
    Computed(Arc<ComputeFn>),
}

impl ProviderValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&ResolutionContext) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Produce the value for `ctx`. `None` means "no value".
    pub fn evaluate(&self, ctx: &ResolutionContext) -> Option<Value> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Computed(f) => f(ctx),
        }
    }
}

impl fmt::Debug for ProviderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Anything that can answer "what replaces this token?".
pub trait ProviderSource: Send + Sync {
    fn get(&self, token: &str) -> Option<ProviderValue>;
}

/// In-memory provider table.
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    entries: HashMap<String, ProviderValue>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<Value>) {
        self.entries
            .insert(token.into(), ProviderValue::literal(value));
    }

    pub fn insert_computed<F>(&mut self, token: impl Into<String>, f: F)
    where
        F: Fn(&ResolutionContext) -> Option<Value> + Send + Sync + 'static,
    {
        self.entries
            .insert(token.into(), ProviderValue::computed(f));
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Literal value of `token`, if the entry is not computed.
    pub fn literal(&self, token: &str) -> Option<&Value> {
        match self.entries.get(token) {
            Some(ProviderValue::Literal(value)) => Some(value),
            _ => None,
        }
    }

    /// Entries of `other` replace entries of `self` with the same token.
    pub fn overlay(mut self, other: ProviderTable) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Build a table from a JSON object of literal values.
    pub fn from_json(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self {
                entries: map
                    .into_iter()
                    .map(|(token, value)| (token, ProviderValue::Literal(value)))
                    .collect(),
            }),
            other => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        }
    }

    /// Read a provider file. `Ok(None)` when the file does not exist.
    pub async fn read_file(path: &Path) -> Result<Option<Self>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TemplarError::storage(path, e)),
        };
        let provider_error = |reason: String| TemplarError::ProviderFile {
            path: path.to_path_buf(),
            reason,
        };
        let value: Value = serde_json::from_slice(&raw).map_err(|e| provider_error(e.to_string()))?;
        Self::from_json(value).map(Some).map_err(provider_error)
    }
}

impl ProviderSource for ProviderTable {
    fn get(&self, token: &str) -> Option<ProviderValue> {
        self.entries.get(token).cloned()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loads the provider table of a project root.
///
/// Loading never fails: a project without an override file simply has an
/// empty table.
#[async_trait]
pub trait ProviderLoader: Send + Sync {
    async fn load(&self, project_root: &Path) -> ProviderTable;
}

/// Reads `<project_root>/<file_name>` as a JSON provider table.
#[derive(Debug, Clone)]
pub struct JsonProviderLoader {
    file_name: String,
}

impl JsonProviderLoader {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

#[async_trait]
impl ProviderLoader for JsonProviderLoader {
    async fn load(&self, project_root: &Path) -> ProviderTable {
        let path = project_root.join(&self.file_name);
        match ProviderTable::read_file(&path).await {
            Ok(Some(table)) => {
                tracing::debug!("loaded {} project provider(s) from {}", table.len(), path.display());
                table
            }
            Ok(None) => ProviderTable::new(),
            Err(e) => {
                tracing::warn!("ignoring project providers at {}: {e}", path.display());
                ProviderTable::new()
            }
        }
    }
}

/// Everything a computed provider can see while a template is resolved.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Template being instantiated.
    pub meta: TemplateMeta,
    /// File base name chosen by the user.
    pub name: String,
    /// Target path relative to its project root.
    pub path: String,
    /// Project root the target belongs to, if any.
    pub project_root: Option<PathBuf>,
    /// Provider table of that project.
    pub project: Arc<ProviderTable>,
}

impl ResolutionContext {
    pub fn new(meta: TemplateMeta, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            meta,
            name: name.into(),
            path: path.into(),
            project_root: None,
            project: Arc::new(ProviderTable::new()),
        }
    }

    pub fn with_project(mut self, root: Option<PathBuf>, table: Arc<ProviderTable>) -> Self {
        self.project_root = root;
        self.project = table;
        self
    }

    /// Literal value of `key`: project entries first, then `meta`, `name`, `path`.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.project.literal(key) {
            return Some(value.clone());
        }
        self.default_value(key)
    }

    pub(crate) fn default_value(&self, key: &str) -> Option<Value> {
        match key {
            "meta" => serde_json::to_value(&self.meta).ok(),
            "name" => Some(Value::String(self.name.clone())),
            "path" => Some(Value::String(self.path.clone())),
            _ => None,
        }
    }
}

/// String form of a provider value. `null` becomes the empty string; strings
/// are used verbatim; arrays and objects are rendered as compact JSON.
pub fn coerce(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Built-in global macros: `date`, `time`, `year`, `timestamp`, `template`, `ext`.
pub fn builtin_macros() -> ProviderTable {
    let mut table = ProviderTable::new();
    table.insert_computed("date", |_| {
        Some(Value::String(chrono::Local::now().format("%Y-%m-%d").to_string()))
    });
    table.insert_computed("time", |_| {
        Some(Value::String(chrono::Local::now().format("%H:%M:%S").to_string()))
    });
    table.insert_computed("year", |_| {
        Some(Value::String(chrono::Local::now().format("%Y").to_string()))
    });
    table.insert_computed("timestamp", |_| Some(Value::from(chrono::Utc::now().timestamp())));
    table.insert_computed("template", |ctx| Some(Value::String(ctx.meta.name.clone())));
    table.insert_computed("ext", |ctx| Some(Value::String(ctx.meta.ext.clone())));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce() {
        assert_eq!(coerce(&Value::Null), "");
        assert_eq!(coerce(&json!("plain")), "plain");
        assert_eq!(coerce(&json!(42)), "42");
        assert_eq!(coerce(&json!(true)), "true");
        assert_eq!(coerce(&json!(["a", 1])), r#"["a",1]"#);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(ProviderTable::from_json(json!(["author"])).is_err());
        let table = ProviderTable::from_json(json!({ "author": "Jane" })).unwrap();
        assert_eq!(table.literal("author"), Some(&json!("Jane")));
    }

    #[test]
    fn test_overlay_replaces_entries() {
        let mut base = ProviderTable::new();
        base.insert("author", "base");
        base.insert("license", "MIT");
        let mut top = ProviderTable::new();
        top.insert("author", "top");
        let merged = base.overlay(top);
        assert_eq!(merged.literal("author"), Some(&json!("top")));
        assert_eq!(merged.literal("license"), Some(&json!("MIT")));
    }

    #[test]
    fn test_context_get_prefers_project_literals() {
        let mut project = ProviderTable::new();
        project.insert("name", "Override");
        project.insert("team", "core");
        let ctx = ResolutionContext::new(TemplateMeta::default(), "Foo", "src/Foo.rs")
            .with_project(None, Arc::new(project));
        assert_eq!(ctx.get("name"), Some(json!("Override")));
        assert_eq!(ctx.get("team"), Some(json!("core")));
        assert_eq!(ctx.get("path"), Some(json!("src/Foo.rs")));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn test_builtin_template_macros() {
        let meta = TemplateMeta {
            name: "Component".into(),
            ext: "tsx".into(),
            ..TemplateMeta::default()
        };
        let ctx = ResolutionContext::new(meta, "Foo", "Foo.tsx");
        let macros = builtin_macros();
        let eval = |token: &str| macros.get(token).and_then(|v| v.evaluate(&ctx)).map(|v| coerce(&v));
        assert_eq!(eval("template").as_deref(), Some("Component"));
        assert_eq!(eval("ext").as_deref(), Some("tsx"));
        assert_eq!(eval("year").map(|y| y.len()), Some(4));
        assert!(eval("unknown").is_none());
    }

    #[tokio::test]
    async fn test_read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProviderTable::read_file(&dir.path().join("macros.json")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_read_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");
        std::fs::write(&path, "42").unwrap();
        assert!(matches!(
            ProviderTable::read_file(&path).await,
            Err(TemplarError::ProviderFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_json_loader_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("templar.json"), "{ nope").unwrap();
        let loader = JsonProviderLoader::new("templar.json");
        assert!(loader.load(dir.path()).await.is_empty());

        let empty = tempfile::tempdir().unwrap();
        assert!(loader.load(empty.path()).await.is_empty());
    }
}
