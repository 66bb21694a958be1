use std::path::Path;

use anyhow::Result;

use templar_core::{TemplateDraft, TemplateService};

use crate::output;

/// Create a template and index it.
///
/// Without `--from` the template starts out empty; edit the file printed at the
/// end to fill it in.
pub async fn run(service: &TemplateService, draft: TemplateDraft, from: Option<&Path>) -> Result<()> {
    output::print_header(&format!("templar add: {}", draft.name));

    let content = super::read_source(from).await?.unwrap_or_default();
    let meta = service.create(draft)?;
    let meta = service.commit(meta, content).await?;

    output::print_success(&format!("Template '{}' added", meta.name));
    output::print_key_value("id", &meta.id);
    output::print_key_value("file", &meta.url.display().to_string());
    Ok(())
}
