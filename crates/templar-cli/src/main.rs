//! templar CLI — manage file templates and create files from them.
//!
//! Commands: `list`, `show`, `add`, `edit`, `remove`, `new` and `init-config`.
//!
//! Every command goes through [`templar_core::TemplateService`]; the CLI never
//! touches the template store directly.

mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use templar_core::config::{self, TemplarConfig};
use templar_core::{Index, TemplateDraft, TemplateService};

#[derive(Parser)]
#[command(
    name = "templar",
    about = "File templates with placeholder substitution",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: <config dir>/templar/config.json)
    #[arg(long, global = true, env = "TEMPLAR_CONFIG")]
    config: Option<PathBuf>,

    /// Template store directory, overrides the config
    #[arg(long, global = true, env = "TEMPLAR_STORE")]
    store: Option<PathBuf>,

    /// Project root for project placeholders (repeatable; default: current directory)
    #[arg(long = "project-root", global = true)]
    project_roots: Vec<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List templates grouped by type
    List,

    /// Show a template's metadata
    Show {
        /// Template id, slug or name
        template: String,

        /// Also print the template source
        #[arg(long)]
        source: bool,
    },

    /// Add a new template
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Prepended to generated file names
        #[arg(long, default_value = "")]
        prefix: String,

        /// Appended to generated file names, before the extension
        #[arg(long, default_value = "")]
        postfix: String,

        /// Group used when listing templates
        #[arg(long = "type", default_value = "")]
        kind: String,

        /// Extension of generated files, without the dot
        #[arg(long, default_value = "")]
        ext: String,

        /// File holding the template source
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Change a template's metadata or source
    Edit {
        /// Template id, slug or name
        template: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        prefix: Option<String>,

        #[arg(long)]
        postfix: Option<String>,

        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        ext: Option<String>,

        /// Replace the template source with this file
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Delete a template
    Remove {
        /// Template id, slug or name
        template: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Create a file from a template
    New {
        /// Template id, slug or name
        template: String,

        /// Base name of the new file (prompted when omitted)
        name: Option<String>,

        /// Directory to create the file in
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Print the resolved content instead of writing it
        #[arg(long)]
        print: bool,
    },

    /// Write a config file with default settings
    InitConfig {
        /// Where to write it (default: the --config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    if let Commands::InitConfig { path, force } = &cli.command {
        let path = path.as_deref().unwrap_or(&config_path);
        return commands::init_config::run(path, *force);
    }

    let config = effective_config(&cli, &config_path)?;
    let service = TemplateService::from_config(&config).await?;
    service.subscribe(Arc::new(|index: &Index| -> anyhow::Result<()> {
        tracing::info!("template index now holds {} template(s)", index.len());
        Ok(())
    }));

    match cli.command {
        Commands::List => commands::list::run(&service).await?,
        Commands::Show { template, source } => {
            commands::show::run(&service, &template, source).await?;
        }
        Commands::Add {
            name,
            prefix,
            postfix,
            kind,
            ext,
            from,
        } => {
            let draft = TemplateDraft {
                name,
                prefix,
                postfix,
                kind,
                ext,
            };
            commands::add::run(&service, draft, from.as_deref()).await?;
        }
        Commands::Edit {
            template,
            name,
            prefix,
            postfix,
            kind,
            ext,
            from,
        } => {
            let changes = commands::edit::MetaChanges {
                name,
                prefix,
                postfix,
                kind,
                ext,
            };
            commands::edit::run(&service, &template, changes, from.as_deref()).await?;
        }
        Commands::Remove { template, yes } => {
            commands::remove::run(&service, &template, yes).await?;
        }
        Commands::New {
            template,
            name,
            dir,
            print,
        } => {
            commands::new::run(&service, &template, &dir, name, print).await?;
        }
        // Handled before the service is built.
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

/// Config file merged with the command-line overrides.
fn effective_config(cli: &Cli, config_path: &std::path::Path) -> anyhow::Result<TemplarConfig> {
    let mut config = TemplarConfig::load_or_default(config_path)?;
    if let Some(store) = &cli.store {
        config.store_root = store.clone();
    }
    config.project_roots.extend(cli.project_roots.iter().cloned());
    if config.project_roots.is_empty() {
        config.project_roots.push(std::env::current_dir()?);
    }
    Ok(config)
}
