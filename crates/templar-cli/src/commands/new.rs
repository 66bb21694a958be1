use std::path::Path;

use anyhow::Result;
use dialoguer::Input;

use templar_core::TemplateService;

use crate::output;

/// Instantiate a template into `dir`.
///
/// Prompts for the file name when none is given. With `print` the resolved
/// content goes to stdout and nothing is written.
pub async fn run(
    service: &TemplateService,
    selector: &str,
    dir: &Path,
    name: Option<String>,
    print: bool,
) -> Result<()> {
    let meta = service.find(selector).await?;

    let name = match name {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt(format!("File name ({})", meta.file_name_for("*")))
            .interact_text()?,
    };

    // Absolute, so the target can be matched against the project roots.
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };

    let instantiation = service.instantiate(&meta, &dir, &name).await?;
    if print {
        print!("{}", instantiation.content);
        return Ok(());
    }

    let target = service.write(&instantiation).await?;
    output::print_success(&format!(
        "Created {} from '{}'",
        instantiation.file_name, meta.name
    ));
    output::print_key_value("path", &target.display().to_string());
    Ok(())
}
