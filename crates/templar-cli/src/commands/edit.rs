use std::path::Path;

use anyhow::Result;

use templar_core::TemplateService;

use crate::output;

/// Field overrides for `templar edit`. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct MetaChanges {
    pub name: Option<String>,
    pub prefix: Option<String>,
    pub postfix: Option<String>,
    pub kind: Option<String>,
    pub ext: Option<String>,
}

/// Update a template's metadata and, with `--from`, its source.
pub async fn run(
    service: &TemplateService,
    selector: &str,
    changes: MetaChanges,
    from: Option<&Path>,
) -> Result<()> {
    let mut meta = service.find(selector).await?;
    output::print_header(&format!("templar edit: {}", meta.name));

    if let Some(name) = changes.name {
        anyhow::ensure!(!name.trim().is_empty(), "the template name cannot be empty");
        meta.name = name;
    }
    if let Some(prefix) = changes.prefix {
        meta.prefix = prefix;
    }
    if let Some(postfix) = changes.postfix {
        meta.postfix = postfix;
    }
    if let Some(kind) = changes.kind {
        meta.kind = kind;
    }
    if let Some(ext) = changes.ext {
        meta.ext = ext;
    }

    if let Some(content) = super::read_source(from).await? {
        service.write_content(&meta, &content).await?;
        output::print_success("Template source replaced");
    }

    let meta = service.update(meta).await?;
    output::print_success(&format!("Template '{}' updated", meta.name));
    Ok(())
}
