use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cloudmatch::csvio;
use cloudmatch::options::{init_options, RecommendOptions};
use cloudmatch::orchestrator::RunContext;
use cloudmatch::provider::{spec_for, Provider, SUPPORTED_PROVIDERS};
use cloudmatch::source::{DirSource, RegionSource, SampleOnlySource};
use cloudmatch::Catalog;

#[derive(Parser)]
#[command(name = "cloudmatch")]
#[command(
    about = "Cloud instance-type recommendations from workload inventory",
    long_about = "cloudmatch reads a CSV of workload rows (CPU, memory, utilization,\nregions) and appends per-provider instance-type recommendations.\n\nSupports:\n  - AWS, Azure, and GCP pricing catalogs\n  - Like-to-like matching (cheapest instance covering the workload)\n  - Utilization-driven right-sizing (N/2, N, N+1 strategy)"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Options file path
    #[arg(short, long, global = true)]
    options: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a workload CSV and write recommendations
    Recommend {
        /// Input workload CSV
        input: PathBuf,
        /// Output CSV path
        #[arg(short = 'O', long, default_value = "recommendations.csv")]
        output: PathBuf,
        /// Providers to run (aws, azure, gcp)
        #[arg(short, long, value_delimiter = ',', default_values_t = ["aws".to_string(), "azure".to_string(), "gcp".to_string()])]
        providers: Vec<String>,
        /// Directory of per-provider region JSON files; sample data is
        /// used when omitted or when a region file is missing
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Show supported providers and their sample catalogs
    Providers,
    /// Initialize an options file
    Init {
        /// Output path for options file
        #[arg(short = 'O', long, default_value = "cloudmatch.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging - suppress INFO by default, only show warnings and errors
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let options = RecommendOptions::load(cli.options.as_deref())?;

    match cli.command {
        Commands::Recommend {
            input,
            output,
            providers,
            data_dir,
        } => {
            recommend(&input, &output, &providers, data_dir, &options).await?;
        }
        Commands::Providers => {
            show_providers().await;
        }
        Commands::Init { output } => {
            init_options(&output)?;
        }
    }

    Ok(())
}

async fn recommend(
    input: &PathBuf,
    output: &PathBuf,
    provider_names: &[String],
    data_dir: Option<PathBuf>,
    options: &RecommendOptions,
) -> Result<()> {
    let providers = provider_names
        .iter()
        .map(|name| Provider::parse(name))
        .collect::<cloudmatch::Result<Vec<Provider>>>()?;

    let source: Box<dyn RegionSource> = match data_dir {
        Some(root) => Box::new(DirSource::new(root)),
        None => Box::new(SampleOnlySource),
    };

    let table = csvio::read_workloads(input)?;
    println!(
        "Processing {} workload rows for {}...",
        style(table.rows.len()).bold(),
        providers
            .iter()
            .map(|p| p.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let context = RunContext::initialize(&table.rows, &providers, options, source.as_ref()).await?;
    let augmented = context.process(&table.rows);

    let mut columns = table.columns.clone();
    for column in context.output_columns() {
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    csvio::write_workloads(output, &columns, &augmented)?;

    println!(
        "{} Wrote {} rows to {}",
        style("Done.").green().bold(),
        augmented.len(),
        style(output.display()).cyan()
    );
    Ok(())
}

async fn show_providers() {
    use comfy_table::{presets::UTF8_FULL, Cell, Table};

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Provider",
        "Default Region",
        "Region Column",
        "Instances",
        "Current Gen",
        "ARM",
        "Families",
    ]);

    for provider in SUPPORTED_PROVIDERS {
        let region = provider.default_region().to_string();
        let catalog = Catalog::load(
            spec_for(provider),
            &SampleOnlySource,
            &[region.clone()].into_iter().collect(),
        )
        .await;
        let stats = catalog.stats();
        let families = catalog.available_families();

        table.add_row(vec![
            Cell::new(provider.display_name()),
            Cell::new(&region),
            Cell::new(provider.region_column()),
            Cell::new(stats.total_instances),
            Cell::new(stats.current_generation),
            Cell::new(stats.arm_instances),
            Cell::new(families.join(", ")),
        ]);
    }

    println!("{table}");
    println!(
        "{}",
        style("Sample catalogs shown; pass --data-dir for real pricing data.").dim()
    );
}
