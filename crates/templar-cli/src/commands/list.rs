use anyhow::Result;

use templar_core::TemplateService;

use crate::output;

/// List templates grouped by type.
pub async fn run(service: &TemplateService) -> Result<()> {
    output::print_header("templar list");

    let groups = service.grouped().await?;
    if groups.is_empty() {
        output::print_warning("No templates yet. Add one with `templar add --name <NAME>`");
        return Ok(());
    }

    for (group, metas) in &groups {
        output::print_group(group);
        for meta in metas {
            let sample = meta.file_name_for("<name>");
            println!("  {:<16} {:<24} {}", meta.id, meta.name, sample);
        }
    }
    Ok(())
}
