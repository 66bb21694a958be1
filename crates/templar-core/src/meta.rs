//! Template metadata records and the index mapping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths;

/// Group name for templates without a `type`.
pub const DEFAULT_GROUP: &str = "Mixed";

/// The persisted mapping from template id to its metadata.
pub type Index = BTreeMap<String, TemplateMeta>;

/// Metadata of one template.
///
/// `url` and `content` are never written to the index: `url` is derived from the
/// store root and the id on every load, and `content` only travels with the
/// record while its backing file is being created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateMeta {
    pub id: String,
    pub name: String,
    pub prefix: String,
    pub postfix: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ext: String,
    #[serde(skip)]
    pub url: PathBuf,
    #[serde(skip)]
    pub content: Option<String>,
}

/// User input for a new template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDraft {
    pub name: String,
    pub prefix: String,
    pub postfix: String,
    pub kind: String,
    pub ext: String,
}

impl TemplateDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl TemplateMeta {
    pub(crate) fn from_draft(id: String, draft: TemplateDraft, store_root: &Path) -> Self {
        let url = paths::template_path(store_root, &id);
        Self {
            id,
            name: draft.name,
            prefix: draft.prefix,
            postfix: draft.postfix,
            kind: draft.kind,
            ext: draft.ext,
            url,
            content: None,
        }
    }

    /// Recompute `url` for the given store root.
    pub(crate) fn locate(&mut self, store_root: &Path) {
        self.url = paths::template_path(store_root, &self.id);
    }

    /// File name produced for `chosen`: `prefix + chosen + postfix`, followed by
    /// `.ext` only when `ext` is non-empty.
    pub fn file_name_for(&self, chosen: &str) -> String {
        let mut file_name = format!("{}{}{}", self.prefix, chosen, self.postfix);
        if !self.ext.is_empty() {
            file_name.push('.');
            file_name.push_str(&self.ext);
        }
        file_name
    }

    /// Grouping label, `Mixed` when no type is set.
    pub fn group(&self) -> &str {
        if self.kind.is_empty() {
            DEFAULT_GROUP
        } else {
            &self.kind
        }
    }

    /// Lower-cased, dash-joined name, e.g. `React Component` -> `react-component`.
    pub fn slug(&self) -> String {
        self.name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Templates grouped by [`TemplateMeta::group`], each group ordered by name.
pub fn group_by_kind(index: &Index) -> BTreeMap<String, Vec<TemplateMeta>> {
    let mut groups: BTreeMap<String, Vec<TemplateMeta>> = BTreeMap::new();
    for meta in index.values() {
        groups
            .entry(meta.group().to_string())
            .or_default()
            .push(meta.clone());
    }
    for metas in groups.values_mut() {
        metas.sort_by(|a, b| a.name.cmp(&b.name));
    }
    groups
}
