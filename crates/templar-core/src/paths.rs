//! Path layout of a template store.
//!
//! ```text
//! <store_root>/
//! ├── index.json          # id -> TemplateMeta
//! ├── index.json.tmp      # scratch file while persisting
//! └── <id>.template       # raw template source, one per template
//! ```

use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.json";
const INDEX_SCRATCH_FILE: &str = "index.json.tmp";
const TEMPLATE_EXT: &str = "template";

/// `<root>/index.json`
pub fn index_path(root: &Path) -> PathBuf {
    root.join(INDEX_FILE)
}

/// `<root>/index.json.tmp`
pub fn scratch_index_path(root: &Path) -> PathBuf {
    root.join(INDEX_SCRATCH_FILE)
}

/// `<root>/<id>.template`
pub fn template_path(root: &Path, id: &str) -> PathBuf {
    root.join(format!("{id}.{TEMPLATE_EXT}"))
}

/// Split `target` into the deepest project root containing it and the path
/// relative to that root.
///
/// Without a matching root the target is returned unchanged.
pub fn relativize(project_roots: &[PathBuf], target: &Path) -> (Option<PathBuf>, PathBuf) {
    let root = project_roots
        .iter()
        .filter(|root| target.starts_with(root))
        .max_by_key(|root| root.components().count());

    match root {
        Some(root) => {
            let relative = target.strip_prefix(root).unwrap_or(target).to_path_buf();
            (Some(root.clone()), relative)
        }
        None => (None, target.to_path_buf()),
    }
}
