mod config;
mod error;
mod mapping;
mod models;
mod render;
mod services;
mod sheets;
mod source;
mod utils;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use error::PipelineError;
use render::TemplateRenderer;
use source::{LocalFileSource, SourceKind};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default ./branch-config.toml is used if present
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a site from the inventory, validate it, and save <SITE_ID>_site_info.json
    Validate {
        /// Site ID to retrieve information for
        site_id: String,

        /// Where to fetch the record from
        #[clap(long, value_enum, default_value = "sheets")]
        source: SourceKind,

        /// Report every invalid field instead of stopping at the first
        #[clap(long)]
        all_errors: bool,
    },

    /// Render <SITE_ID>_Branch_config.yml from the site record and template
    Generate {
        /// Site ID to generate the config for
        site_id: String,

        /// Where to fetch the record from (defaults to the configured source)
        #[clap(long, value_enum)]
        source: Option<SourceKind>,

        /// Template file, overrides template_path
        #[clap(short, long)]
        template: Option<PathBuf>,

        /// Output directory, overrides output_dir
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// List the template placeholders produced by the mapping table
    Fields,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env is fine
    dotenvy::dotenv().ok();

    let default_filter = if cli.debug {
        "branch_config=debug"
    } else {
        "branch_config=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<PipelineError>()
                .map(PipelineError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate {
            site_id,
            source,
            all_errors,
        } => {
            let source = source::build(source, &cfg)?;
            let store = LocalFileSource::new(&cfg.data_dir);
            let path =
                services::site_handler::validate_site(source.as_ref(), &cfg.rules, &store, &site_id, all_errors)?;
            println!("Site information is valid.");
            println!("Site information saved to {}.", path.display());
        }
        Commands::Generate {
            site_id,
            source,
            template,
            output,
        } => {
            let template_path = template.unwrap_or_else(|| cfg.template_path.clone());
            let output_dir = output.unwrap_or_else(|| cfg.output_dir.clone());

            // Load the template first so a broken template fails before any fetch
            let renderer = TemplateRenderer::load(&template_path)?;
            let source = source::build(source.unwrap_or(cfg.source), &cfg)?;
            let path = services::site_handler::generate_site(
                source.as_ref(),
                &cfg.rules,
                &cfg.mapping,
                &renderer,
                &output_dir,
                &site_id,
            )?;
            println!("Branch config file {} generated successfully", path.display());
        }
        Commands::Fields => {
            for field in &cfg.mapping.fields {
                let default = field
                    .default
                    .as_deref()
                    .map(|d| format!(" (default {:?})", d))
                    .unwrap_or_default();
                println!(
                    "{}\t<- {} [{}]{}",
                    field.placeholder,
                    field.source,
                    field.transform.name(),
                    default
                );
            }
            if cfg.mapping.passthrough {
                println!("*\t<- every other source field, unchanged");
            }
        }
    }

    Ok(())
}
