//! The placeholder engine: pattern compilation, project table caching and
//! layered token lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::{Captures, Regex, RegexBuilder};
use tokio::sync::Mutex;

use super::provider::{
    builtin_macros, coerce, JsonProviderLoader, ProviderLoader, ProviderSource, ProviderTable,
    ResolutionContext,
};
use crate::config::TemplarConfig;
use crate::error::{Result, TemplarError};
use crate::meta::TemplateMeta;
use crate::paths;

/// Compiles the placeholder pattern and resolves tokens against layered providers.
///
/// Project tables are loaded on first use per project root and cached for the
/// lifetime of the engine.
pub struct PlaceholderEngine {
    pattern: Regex,
    global: Arc<dyn ProviderSource>,
    project_roots: Vec<PathBuf>,
    loader: Arc<dyn ProviderLoader>,
    project_cache: Mutex<HashMap<PathBuf, Arc<ProviderTable>>>,
}

impl PlaceholderEngine {
    /// Create an engine for `pattern`, which must contain exactly one capturing group.
    ///
    /// `global` is the lowest-precedence provider layer. Matching is
    /// case-insensitive. No project roots are known until
    /// [`with_project_roots`](Self::with_project_roots) is called.
    pub fn new<S>(pattern: &str, global: S) -> Result<Self>
    where
        S: ProviderSource + 'static,
    {
        let invalid = |reason: String| TemplarError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| invalid(e.to_string()))?;
        // captures_len counts the implicit whole-match group.
        let groups = regex.captures_len() - 1;
        if groups != 1 {
            return Err(invalid(format!(
                "expected exactly one capturing group, found {groups}"
            )));
        }

        Ok(Self {
            pattern: regex,
            global: Arc::new(global),
            project_roots: Vec::new(),
            loader: Arc::new(JsonProviderLoader::new(crate::config::DEFAULT_PROJECT_FILE)),
            project_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Build the engine described by `config`: its pattern, the built-in macros
    /// overlaid by the macro file, its project roots and project file name.
    ///
    /// A configured macro file that does not exist yields no extra macros; one
    /// that exists but is malformed is an error.
    pub async fn from_config(config: &TemplarConfig) -> Result<Self> {
        let mut global = builtin_macros();
        if let Some(macro_file) = &config.macro_file {
            match ProviderTable::read_file(macro_file).await? {
                Some(table) => global = global.overlay(table),
                None => tracing::warn!("macro file {} does not exist", macro_file.display()),
            }
        }

        Ok(Self::new(&config.pattern, global)?
            .with_project_roots(config.project_roots.clone())
            .with_loader(Arc::new(JsonProviderLoader::new(&config.project_file))))
    }

    pub fn with_project_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.project_roots = roots;
        self
    }

    /// Replace the global provider layer.
    pub fn with_global_source(mut self, global: Arc<dyn ProviderSource>) -> Self {
        self.global = global;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ProviderLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Provider table of `root`, loading and caching it on first use.
    pub async fn project_table(&self, root: &Path) -> Arc<ProviderTable> {
        let mut cache = self.project_cache.lock().await;
        if let Some(table) = cache.get(root) {
            return Arc::clone(table);
        }
        let table = Arc::new(self.loader.load(root).await);
        cache.insert(root.to_path_buf(), Arc::clone(&table));
        table
    }

    /// Context for instantiating `meta` as `name` at `target`.
    ///
    /// `path` is the target relative to the deepest known project root
    /// containing it; targets outside every root keep their full path and get
    /// an empty project table.
    pub async fn context_for(
        &self,
        meta: &TemplateMeta,
        name: &str,
        target: &Path,
    ) -> ResolutionContext {
        let (root, relative) = paths::relativize(&self.project_roots, target);
        let table = match &root {
            Some(root) => self.project_table(root).await,
            None => Arc::new(ProviderTable::new()),
        };
        ResolutionContext::new(meta.clone(), name, relative.to_string_lossy())
            .with_project(root, table)
    }

    /// Replace every placeholder in `content`.
    pub fn resolve(&self, content: &str, ctx: &ResolutionContext) -> String {
        self.pattern
            .replace_all(content, |caps: &Captures| {
                caps.get(1)
                    .map(|token| self.lookup(token.as_str(), ctx))
                    .unwrap_or_default()
            })
            .into_owned()
    }

    fn lookup(&self, token: &str, ctx: &ResolutionContext) -> String {
        let value = match ctx.project.get(token) {
            Some(provider) => provider.evaluate(ctx),
            None => match ctx.default_value(token) {
                Some(value) => Some(value),
                None => self.global.get(token).and_then(|provider| provider.evaluate(ctx)),
            },
        };
        value.map(|v| coerce(&v)).unwrap_or_default()
    }
}
