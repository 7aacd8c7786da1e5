#![deny(unsafe_code)]

//! toolreg CLI — build bundles and the search index, then query it.

mod commands;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use toolreg_config::AppConfig;
use toolreg_core::Query;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// toolreg — curate tool bundles and search a tool registry.
#[derive(Parser)]
#[command(name = "toolreg", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "toolreg.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every rule set into a bundle file.
    Bundles,

    /// Build the search index and derived artifacts.
    Index,

    /// Run `bundles` then `index`.
    Build,

    /// Filter and rank the index.
    Query(QueryArgs),

    /// Summarize tags, bundles, and totals.
    Facets {
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },

    /// Show version and build information.
    Version,
}

#[derive(Args)]
struct QueryArgs {
    /// Only the tool with this exact id.
    #[arg(long)]
    id: Option<String>,

    /// Only tools carrying this tag.
    #[arg(long)]
    tag: Option<String>,

    /// Only tools declaring this capability.
    #[arg(long = "cap")]
    capability: Option<String>,

    /// Only tools in this bundle.
    #[arg(long)]
    bundle: Option<String>,

    /// Free text to rank by.
    #[arg(long = "q")]
    text: Option<String>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Show why each tool matched.
    #[arg(long)]
    explain: bool,

    /// Index file to read instead of the configured one.
    #[arg(long)]
    index: Option<PathBuf>,
}

impl QueryArgs {
    fn to_query(&self) -> Query {
        Query {
            id: self.id.clone(),
            tag: self.tag.clone(),
            bundle: self.bundle.clone(),
            capability: self.capability.clone(),
            text: self.text.clone(),
            explain: self.explain,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let config = load_config(&cli.config, config_found).await?;

    // -v overrides the configured level
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !config_found {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Bundles => {
            let bundles = commands::bundles(&config).await?;
            print!("{}", output::render_bundle_summary(&bundles));
        }
        Commands::Index => {
            let summary = commands::index(&config).await?;
            print!("{}", output::render_index_summary(&summary));
        }
        Commands::Build => {
            let bundles = commands::bundles(&config).await?;
            print!("{}", output::render_bundle_summary(&bundles));
            let summary = commands::index(&config).await?;
            print!("{}", output::render_index_summary(&summary));
        }
        Commands::Query(args) => cmd_query(&config, &args).await?,
        Commands::Facets { json } => {
            let facets = commands::facets(&config).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&facets)?);
            } else {
                print!("{}", output::render_facets(&facets));
            }
        }
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
        Commands::Version => println!("toolreg {}", toolreg_core::build_info::version_string()),
    }

    Ok(())
}

async fn cmd_query(config: &AppConfig, args: &QueryArgs) -> Result<()> {
    let index_path = args.index.clone().unwrap_or_else(|| config.index_path());
    let query = args.to_query();
    let results = commands::query(&index_path, &query).await?;

    if args.json {
        let views: Vec<_> = results.iter().map(|r| r.view(query.explain)).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        print!("{}", output::render_results(&results, query.explain));
    }
    Ok(())
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str = toml::to_string_pretty(config).context("failed to render configuration")?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

/// Load `path` if it exists, otherwise fall back to defaults.
///
/// Runs before tracing is initialised, so nothing is logged here.
async fn load_config(path: &Path, found: bool) -> Result<AppConfig> {
    if found {
        AppConfig::load(path)
            .await
            .with_context(|| format!("invalid configuration in {}", path.display()))
    } else {
        Ok(AppConfig::default())
    }
}
