use anyhow::Result;
use dialoguer::Confirm;

use templar_core::TemplateService;

use crate::output;

/// Delete a template after confirmation (skipped with `--yes`).
pub async fn run(service: &TemplateService, selector: &str, yes: bool) -> Result<()> {
    let meta = service.find(selector).await?;
    output::print_header(&format!("templar remove: {}", meta.name));

    let confirmed = yes
        || Confirm::new()
            .with_prompt(format!("Delete template '{}' ({})?", meta.name, meta.id))
            .default(false)
            .interact()?;
    if !confirmed {
        output::print_warning("Aborted, nothing removed");
        return Ok(());
    }

    let index = service.remove(&meta).await?;
    output::print_success(&format!(
        "Template '{}' removed, {} left",
        meta.name,
        index.len()
    ));
    Ok(())
}
