//! Persistence of the template index (`<store_root>/index.json`).
//!
//! The store keeps no in-memory copy of the index: every [`IndexStore::load`]
//! reads the file again so callers always see what is on disk. A
//! load-mutate-[`IndexStore::persist`] sequence is the unit of work; overlapping
//! sequences for the same id race and the last persist wins.
//!
//! ## Change notification
//!
//! Listeners run synchronously after the new index has been written. Notification
//! is part of the persist transaction: if a listener fails, `persist` reports
//! [`TemplarError::Subscriber`] even though the file is already on disk, and the
//! listeners after it are not called. A failed write never notifies anyone.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, TemplarError};
use crate::meta::Index;
use crate::paths;

/// Receives the full index after every successful persist.
pub trait IndexListener: Send + Sync {
    fn on_change(&self, index: &Index) -> anyhow::Result<()>;
}

impl<F> IndexListener for F
where
    F: Fn(&Index) -> anyhow::Result<()> + Send + Sync,
{
    fn on_change(&self, index: &Index) -> anyhow::Result<()> {
        self(index)
    }
}

/// Handle returned by [`IndexStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
}

/// Owner of the on-disk index file.
pub struct IndexStore {
    root: PathBuf,
    listeners: Mutex<Vec<(u64, Arc<dyn IndexListener>)>>,
    next_listener: AtomicU64,
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the index from disk.
    ///
    /// Creates the store directory if needed. A missing `index.json` is the
    /// first-run state and yields an empty index.
    pub async fn load(&self) -> Result<Index> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| TemplarError::storage(&self.root, e))?;

        let path = paths::index_path(&self.root);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no index at {}, starting empty", path.display());
                return Ok(Index::new());
            }
            Err(e) => return Err(TemplarError::storage(path, e)),
        };

        let mut index: Index =
            serde_json::from_slice(&raw).map_err(|e| TemplarError::CorruptIndex {
                path: path.clone(),
                source: e,
            })?;

        for (key, meta) in index.iter_mut() {
            if meta.id != *key {
                tracing::warn!("index entry {key} carries id '{}', using the key", meta.id);
                meta.id = key.clone();
            }
            meta.locate(&self.root);
        }

        Ok(index)
    }

    /// Write `index` to disk, then notify every listener.
    ///
    /// The file is written and synced to a scratch path, then renamed over
    /// `index.json`, so a failed or interrupted write leaves the previous index
    /// intact.
    pub async fn persist(&self, index: &Index) -> Result<()> {
        let path = paths::index_path(&self.root);
        let json = serde_json::to_string_pretty(index).map_err(|e| {
            TemplarError::storage(&path, std::io::Error::new(ErrorKind::InvalidData, e))
        })?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| TemplarError::storage(&self.root, e))?;

        let scratch = paths::scratch_index_path(&self.root);
        let scratch_error = |e: std::io::Error| TemplarError::storage(&scratch, e);
        let mut file = fs::File::create(&scratch).await.map_err(scratch_error)?;
        file.write_all(json.as_bytes()).await.map_err(scratch_error)?;
        file.sync_all().await.map_err(scratch_error)?;
        drop(file);
        fs::rename(&scratch, &path)
            .await
            .map_err(|e| TemplarError::storage(&path, e))?;

        tracing::info!("persisted {} template(s) to {}", index.len(), path.display());
        self.notify(index)
    }

    /// Register a listener. Registering the same `Arc` twice returns the
    /// existing subscription.
    pub fn subscribe(&self, listener: Arc<dyn IndexListener>) -> Subscription {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);

        let existing = listeners
            .iter()
            .find(|(_, registered)| same_listener(registered, &listener));
        if let Some((id, _)) = existing {
            return Subscription { id: *id };
        }

        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        listeners.push((id, listener));
        Subscription { id }
    }

    /// Remove one registration. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        match listeners.iter().position(|(id, _)| *id == subscription.id) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self, index: &Index) -> Result<()> {
        // Snapshot so listeners may (un)subscribe without deadlocking.
        let listeners: Vec<Arc<dyn IndexListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener.on_change(index).map_err(TemplarError::Subscriber)?;
        }
        Ok(())
    }
}

fn same_listener(a: &Arc<dyn IndexListener>, b: &Arc<dyn IndexListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::TemplateMeta;
    use std::sync::atomic::AtomicUsize;

    fn entry(id: &str, name: &str) -> (String, TemplateMeta) {
        (
            id.to_string(),
            TemplateMeta {
                id: id.into(),
                name: name.into(),
                ext: "rs".into(),
                ..TemplateMeta::default()
            },
        )
    }

    fn counting_listener(counter: Arc<AtomicUsize>) -> Arc<dyn IndexListener> {
        Arc::new(move |_: &Index| -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_load_missing_index_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("store"));
        let index = store.load().await.unwrap();
        assert!(index.is_empty());
        assert!(dir.path().join("store").is_dir());
    }

    #[tokio::test]
    async fn test_load_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(paths::index_path(dir.path()), "{ broken").unwrap();
        let store = IndexStore::new(dir.path());
        assert!(matches!(
            store.load().await,
            Err(TemplarError::CorruptIndex { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_unreadable_index_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(paths::index_path(dir.path())).unwrap();
        let store = IndexStore::new(dir.path());
        assert!(matches!(
            store.load().await,
            Err(TemplarError::Storage { .. })
        ));
    }

    #[tokio::test]
    async fn test_persist_replaces_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(paths::scratch_index_path(dir.path()), "leftover from a crash").unwrap();
        let store = IndexStore::new(dir.path());
        let index: Index = [entry("1", "One")].into_iter().collect();
        store.persist(&index).await.unwrap();
        assert!(!paths::scratch_index_path(dir.path()).exists());
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_recomputes_url_and_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            paths::index_path(dir.path()),
            r#"{"42":{"id":"stale","name":"Foo","url":"/elsewhere/x.template"}}"#,
        )
        .unwrap();
        let store = IndexStore::new(dir.path());
        let index = store.load().await.unwrap();
        let meta = &index["42"];
        assert_eq!(meta.id, "42");
        assert_eq!(meta.url, paths::template_path(dir.path(), "42"));
    }

    #[tokio::test]
    async fn test_persist_roundtrip_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let index: Index = [entry("2", "Two"), entry("1", "One")].into_iter().collect();
        store.persist(&index).await.unwrap();
        let first = std::fs::read(paths::index_path(dir.path())).unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        store.persist(&loaded).await.unwrap();
        let second = std::fs::read(paths::index_path(dir.path())).unwrap();

        assert_eq!(first, second);
        assert!(!paths::scratch_index_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_persist_notifies_listeners() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(Arc::new(move |index: &Index| -> anyhow::Result<()> {
            sink.lock().unwrap().push(index.len());
            Ok(())
        }));

        let index: Index = [entry("1", "One")].into_iter().collect();
        store.persist(&index).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_duplicate_subscription_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(Arc::clone(&counter));

        let first = store.subscribe(Arc::clone(&listener));
        let second = store.subscribe(Arc::clone(&listener));
        assert_eq!(first, second);
        assert_eq!(store.listener_count(), 1);

        store.persist(&Index::new()).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let counter = Arc::new(AtomicUsize::new(0));
        let a = store.subscribe(counting_listener(Arc::clone(&counter)));
        let _b = store.subscribe(counting_listener(Arc::clone(&counter)));

        assert!(store.unsubscribe(&a));
        assert!(!store.unsubscribe(&a));
        assert_eq!(store.listener_count(), 1);

        store.persist(&Index::new()).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_listener_fails_persist_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        store.subscribe(Arc::new(|_: &Index| -> anyhow::Result<()> {
            anyhow::bail!("view is gone")
        }));

        let index: Index = [entry("1", "One")].into_iter().collect();
        let result = store.persist(&index).await;
        assert!(matches!(result, Err(TemplarError::Subscriber(_))));

        // The write itself went through.
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_does_not_notify() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the store directory should be.
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, "").unwrap();
        let store = IndexStore::new(&root);
        let counter = Arc::new(AtomicUsize::new(0));
        store.subscribe(counting_listener(Arc::clone(&counter)));

        let result = store.persist(&Index::new()).await;
        assert!(matches!(result, Err(TemplarError::Storage { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
