//! Template lifecycle: create, update, remove and instantiate.
//!
//! ## Creating a template
//!
//! Creation is two-phase. [`TemplateService::create`] validates the draft and
//! returns a provisional [`TemplateMeta`] with a fresh id; nothing is written.
//! [`TemplateService::commit`] attaches the content, writes the backing file and
//! indexes the record.
//!
//! ## Instantiating a template
//!
//! ```text
//! Requested -> ExistenceChecked -> ContentLoaded -> Resolved -> Written
//!                    |                   |                        |
//!              AlreadyExists    TemplateUnreadable           WriteFailed
//! ```
//!
//! Errors while writing are always `WriteFailed`, including a target that
//! appeared between the existence check and the write.
//!
//! [`TemplateService::instantiate`] stops at `Resolved` and returns the result
//! without touching the target, so the caller can inspect it before
//! [`TemplateService::write`]. Nothing is retried.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::TemplarConfig;
use crate::error::{Result, TemplarError};
use crate::index::{IndexListener, IndexStore, Subscription};
use crate::meta::{group_by_kind, Index, TemplateDraft, TemplateMeta};
use crate::paths;
use crate::placeholder::PlaceholderEngine;

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp id, bumped past the previous one when the clock has
/// not advanced.
fn next_id() -> String {
    let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// A resolved template, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instantiation {
    /// File name of the target, e.g. `FooController.ts`.
    pub file_name: String,
    /// Full path of the file to create.
    pub file_target: PathBuf,
    /// Content with every placeholder replaced.
    pub content: String,
}

/// Entry point for collaborators: owns the index store and the placeholder engine.
pub struct TemplateService {
    store: IndexStore,
    engine: PlaceholderEngine,
}

impl TemplateService {
    pub fn new(store: IndexStore, engine: PlaceholderEngine) -> Self {
        Self { store, engine }
    }

    /// Build the store and engine described by `config`.
    pub async fn from_config(config: &TemplarConfig) -> Result<Self> {
        let engine = PlaceholderEngine::from_config(config).await?;
        Ok(Self::new(IndexStore::new(&config.store_root), engine))
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn engine(&self) -> &PlaceholderEngine {
        &self.engine
    }

    /// All indexed templates.
    pub async fn list(&self) -> Result<Index> {
        self.store.load().await
    }

    /// Templates grouped by type.
    pub async fn grouped(&self) -> Result<BTreeMap<String, Vec<TemplateMeta>>> {
        Ok(group_by_kind(&self.list().await?))
    }

    pub async fn get(&self, id: &str) -> Result<TemplateMeta> {
        self.list()
            .await?
            .remove(id)
            .ok_or_else(|| TemplarError::NotFound(id.to_string()))
    }

    /// Look a template up by id, slug or name (case-insensitive), in that order.
    pub async fn find(&self, selector: &str) -> Result<TemplateMeta> {
        let mut index = self.list().await?;
        if let Some(meta) = index.remove(selector) {
            return Ok(meta);
        }
        let wanted = selector.to_lowercase();
        let by_slug = index.values().find(|meta| meta.slug() == wanted);
        let by_name = || index.values().find(|meta| meta.name.to_lowercase() == wanted);
        by_slug
            .or_else(by_name)
            .cloned()
            .ok_or_else(|| TemplarError::NotFound(selector.to_string()))
    }

    /// Validate `draft` and assign it an id. The result is provisional: it is not
    /// indexed until [`commit`](Self::commit) succeeds.
    pub fn create(&self, draft: TemplateDraft) -> Result<TemplateMeta> {
        if draft.name.trim().is_empty() {
            return Err(TemplarError::Validation("the 'name' field is required".into()));
        }
        let meta = TemplateMeta::from_draft(next_id(), draft, self.store.root());
        tracing::debug!("provisional template {} ({})", meta.id, meta.name);
        Ok(meta)
    }

    /// Attach `content` to a provisional template and index it.
    pub async fn commit(&self, mut meta: TemplateMeta, content: String) -> Result<TemplateMeta> {
        meta.content = Some(content);
        self.update(meta).await
    }

    /// Index `meta`, creating its backing file from `meta.content` if it does not
    /// exist yet.
    ///
    /// When the backing file is missing and no content is given the call fails
    /// with `NotFound`, and a stale index entry for the id is removed first.
    /// Content is never stored in the index and never overwrites an existing
    /// backing file; use [`write_content`](Self::write_content) for that.
    pub async fn update(&self, mut meta: TemplateMeta) -> Result<TemplateMeta> {
        if meta.id.is_empty() {
            return Err(TemplarError::Validation("the 'id' field is required".into()));
        }
        meta.locate(self.store.root());

        let mut index = self.store.load().await?;
        let exists = fs::try_exists(&meta.url)
            .await
            .map_err(|e| TemplarError::storage(&meta.url, e))?;

        if !exists {
            let Some(content) = meta.content.take() else {
                if index.remove(&meta.id).is_some() {
                    tracing::warn!("dropping index entry {}: backing file is gone", meta.id);
                    self.store.persist(&index).await?;
                }
                return Err(TemplarError::NotFound(meta.url.display().to_string()));
            };
            fs::write(&meta.url, content)
                .await
                .map_err(|e| TemplarError::storage(&meta.url, e))?;
        }

        meta.content = None;
        index.insert(meta.id.clone(), meta.clone());
        self.store.persist(&index).await?;
        Ok(meta)
    }

    /// Raw, unresolved source of a template.
    pub async fn read_content(&self, meta: &TemplateMeta) -> Result<String> {
        let url = paths::template_path(self.store.root(), &meta.id);
        fs::read_to_string(&url)
            .await
            .map_err(|e| TemplarError::TemplateUnreadable { path: url, source: e })
    }

    /// Replace the source of an indexed template.
    pub async fn write_content(&self, meta: &TemplateMeta, content: &str) -> Result<()> {
        if !self.store.load().await?.contains_key(&meta.id) {
            return Err(TemplarError::NotFound(meta.id.clone()));
        }
        let url = paths::template_path(self.store.root(), &meta.id);
        fs::write(&url, content)
            .await
            .map_err(|e| TemplarError::storage(url, e))
    }

    /// Remove a template from the index and delete its backing file.
    ///
    /// Removing an id that is not indexed changes nothing. Failing to delete the
    /// backing file is logged and does not keep the entry in the index.
    pub async fn remove(&self, meta: &TemplateMeta) -> Result<Index> {
        let mut index = self.store.load().await?;
        if index.remove(&meta.id).is_none() {
            tracing::debug!("template {} is not indexed, nothing to remove", meta.id);
            return Ok(index);
        }

        let url = paths::template_path(self.store.root(), &meta.id);
        match fs::remove_file(&url).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("could not delete {}: {e}", url.display()),
        }

        self.store.persist(&index).await?;
        Ok(index)
    }

    /// Resolve `meta` into a new file named after `name` inside `dir`.
    ///
    /// Fails with `AlreadyExists` if the target is present. Nothing is written.
    pub async fn instantiate(
        &self,
        meta: &TemplateMeta,
        dir: &Path,
        name: &str,
    ) -> Result<Instantiation> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TemplarError::Validation("a file name is required".into()));
        }
        let file_name = meta.file_name_for(name);
        let file_target = dir.join(&file_name);
        tracing::debug!("instantiate {} -> {}: requested", meta.id, file_target.display());

        let exists = fs::try_exists(&file_target)
            .await
            .map_err(|e| TemplarError::storage(&file_target, e))?;
        if exists {
            return Err(TemplarError::AlreadyExists(file_target));
        }
        tracing::debug!("instantiate {}: existence checked", meta.id);

        let source = self.read_content(meta).await?;
        tracing::debug!("instantiate {}: content loaded", meta.id);

        let ctx = self.engine.context_for(meta, name, &file_target).await;
        let content = self.engine.resolve(&source, &ctx);
        tracing::debug!("instantiate {}: resolved", meta.id);

        Ok(Instantiation {
            file_name,
            file_target,
            content,
        })
    }

    /// Create the target file of `instantiation`.
    ///
    /// Never overwrites an existing file: a target that appeared after
    /// [`instantiate`](Self::instantiate) checked for it fails with `WriteFailed`,
    /// like every other error at this stage.
    pub async fn write(&self, instantiation: &Instantiation) -> Result<PathBuf> {
        let target = &instantiation.file_target;
        let write_failed = |source: std::io::Error| TemplarError::WriteFailed {
            path: target.clone(),
            source,
        };

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)
            .await
            .map_err(write_failed)?;
        file.write_all(instantiation.content.as_bytes())
            .await
            .map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;

        tracing::info!("created {}", target.display());
        Ok(target.clone())
    }

    pub fn subscribe(&self, listener: Arc<dyn IndexListener>) -> Subscription {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.store.unsubscribe(subscription)
    }
}
