use anyhow::Result;

use templar_core::TemplateService;

use crate::output;

/// Print one template's metadata, and its source with `--source`.
pub async fn run(service: &TemplateService, selector: &str, source: bool) -> Result<()> {
    let meta = service.find(selector).await?;
    output::print_header(&format!("templar show: {}", meta.name));

    output::print_key_value("id", &meta.id);
    output::print_key_value("type", meta.group());
    output::print_key_value("prefix", &meta.prefix);
    output::print_key_value("postfix", &meta.postfix);
    output::print_key_value("ext", &meta.ext);
    output::print_key_value("file", &meta.url.display().to_string());
    output::print_key_value("command", &format!("create-{}", meta.slug()));

    if source {
        println!();
        print!("{}", service.read_content(&meta).await?);
    }
    Ok(())
}
