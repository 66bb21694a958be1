//! CLI command implementations for templar.
//!
//! Each module corresponds to a subcommand (`templar <command>`).

pub mod add;
pub mod edit;
pub mod init_config;
pub mod list;
pub mod new;
pub mod remove;
pub mod show;

use std::path::Path;

use anyhow::{Context, Result};

/// Read template source from `path`, or `None` when no path was given.
pub(crate) async fn read_source(path: Option<&Path>) -> Result<Option<String>> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map(Some)
            .with_context(|| format!("failed to read template source {}", path.display())),
        None => Ok(None),
    }
}
