mod harvest;
mod view;

use std::path::PathBuf;

use armap_core::RelationshipFilter;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "armap")]
#[command(about = "Map principal firms and their appointed representatives")]
struct Cli {
    /// Firm table to read (defaults to ARMAP_FIRMS_CSV)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the principal firm names found in the firm table
    Principals,
    /// Print AR counts by relationship for a principal (or every firm)
    Stats {
        /// Principal firm name; omit to count every firm
        #[arg(long)]
        principal: Option<String>,
        /// Print the counts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render the map document to a file
    Map {
        /// Principal firm name; omit to map every firm
        #[arg(long)]
        principal: Option<String>,
        /// Relationship filter: all, introducer or full
        #[arg(long, default_value = "all")]
        relationship: RelationshipFilter,
        /// Output path (defaults to ARMAP_MAP_OUTPUT)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fill the ARDetails column of a firm list from the register
    Harvest {
        /// CSV with SearchedFCANumber and NumberOfCurrentARs columns
        #[arg(long)]
        input: PathBuf,
        /// Where to write the enriched CSV (defaults to rewriting the input)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Concurrent register requests (defaults to ARMAP_HARVEST_MAX_CONCURRENT)
        #[arg(long)]
        max_concurrent: Option<usize>,
        /// Skip firms reporting fewer ARs (defaults to ARMAP_HARVEST_MIN_AR_COUNT)
        #[arg(long)]
        min_ars: Option<u32>,
        /// List the firms that would be fetched without calling the register
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = armap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "configuration loaded");

    let cli = Cli::parse();
    let csv = cli.csv.unwrap_or_else(|| config.firms_csv_path.clone());

    match cli.command {
        Some(Commands::Principals) => view::run_principals(&csv)?,
        Some(Commands::Stats { principal, json }) => {
            view::run_stats(&config, &csv, principal.as_deref().unwrap_or_default(), json).await?;
        }
        Some(Commands::Map {
            principal,
            relationship,
            output,
        }) => {
            let output = output.unwrap_or_else(|| config.map_output_path.clone());
            view::run_map(
                &config,
                &csv,
                principal.as_deref().unwrap_or_default(),
                relationship,
                &output,
            )
            .await?;
        }
        Some(Commands::Harvest {
            input,
            output,
            max_concurrent,
            min_ars,
            dry_run,
        }) => {
            let output = output.unwrap_or_else(|| input.clone());
            let settings = armap_register::HarvestConfig {
                max_concurrent: max_concurrent.unwrap_or(config.harvest_max_concurrent),
                min_ar_count: min_ars.unwrap_or(config.harvest_min_ar_count),
            };
            if dry_run {
                harvest::run_harvest_dry_run(&input, settings)?;
            } else {
                harvest::run_harvest(&config, &input, &output, settings).await?;
            }
        }
        None => Cli::command().print_help()?,
    }

    Ok(())
}
