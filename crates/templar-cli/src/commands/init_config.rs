use std::path::Path;

use anyhow::Result;

use templar_core::config::TemplarConfig;

use crate::output;

/// Write a config file with default settings.
pub fn run(path: &Path, force: bool) -> Result<()> {
    output::print_header("templar init-config");

    anyhow::ensure!(
        force || !path.exists(),
        "{} already exists (use --force to overwrite)",
        path.display()
    );

    let config = TemplarConfig::default();
    config.save(path)?;

    output::print_success(&format!("Wrote {}", path.display()));
    output::print_key_value("store_root", &config.store_root.display().to_string());
    output::print_key_value("pattern", &config.pattern);
    output::print_key_value("project_file", &config.project_file);
    Ok(())
}
