//! credforge CLI - synthetic credential-corpus generation for
//! password-reuse research.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credforge::{
    BatchGenerator, Config, CorpusStore, OpenRouterClient, Reporter, StudyPipeline,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "credforge")]
#[command(author = "Infernet <dev@infernet.org>")]
#[command(version)]
#[command(about = "Synthetic credential-corpus generation via OpenRouter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the generation study until the target corpus size is reached
    Run {
        /// Pin generation to a single sector instead of rotating
        sector: Option<String>,
    },

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn print_example_config() {
    let example = r#"# credforge configuration file

[openrouter]
# API key (can also use OPENROUTER_API_KEY env var)
# api_key = "sk-..."
base_url = "https://openrouter.ai/api/v1"
timeout_secs = 180
max_retries = 3

[generation]
model = "google/gemini-2.0-flash-001"
temperature = 1.4
target_count = 2500
chunk_size = 15
sectors = ["Banking", "Healthcare", "Construction", "Education", "Retail", "Tech"]
blocklist_enabled = true
backoff_secs = 2

[output]
snapshot_path = "personas.json"
export_path = "credentials.csv"
summary_path = "data_summary.txt"
# include sector/behavior columns in the credential export
extended_export = false
"#;
    println!("{example}");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Example => {
            print_example_config();
        }

        Commands::Validate => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
            config.validate().context("Invalid configuration")?;
            config
                .resolve_api_key()
                .context("Failed to resolve API key")?;

            info!("Configuration is valid");
            info!("  Model:   {}", config.generation.model);
            info!(
                "  Target:  {} personas in chunks of {}",
                config.generation.target_count, config.generation.chunk_size
            );
            info!("  Sectors: {}", config.generation.sectors.join(", "));
        }

        Commands::Run { sector } => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
            config.validate().context("Invalid configuration")?;

            let api_key = config
                .resolve_api_key()
                .context("Failed to resolve API key")?;

            let client = Arc::new(OpenRouterClient::new(
                api_key,
                Some(config.openrouter.base_url.clone()),
                Some(config.openrouter.timeout_secs),
                Some(config.openrouter.max_retries),
            )?);

            let generator = BatchGenerator::new(Arc::clone(&client), config.generation.clone());
            let mut store = CorpusStore::load(&config.output.snapshot_path);
            let reporter = Reporter::new(&config.output);
            let pipeline = StudyPipeline::new(generator, config.clone());

            let report = pipeline
                .run(&mut store, &reporter, sector.as_deref())
                .await?;

            println!("\n=== Generation Complete ===");
            println!("Accepted:    {} / {}", report.accepted, report.target);
            println!("Attempted:   {}", report.attempted);
            println!("Rejections:  dupe: {}, pattern: {}, complexity: {}, blocklist: {}",
                report.rejected_duplicate,
                report.rejected_pattern,
                report.rejected_complexity,
                report.rejected_blocklist
            );
            println!("Batches:     {}", report.requests);
            println!("HTTP calls:  {}", client.total_requests());
            println!("Runtime:     {:.1}s", report.runtime_secs);
            println!("Snapshot:    {:?}", config.output.snapshot_path);
            println!("Export:      {:?}", config.output.export_path);
            println!("Summary:     {:?}", config.output.summary_path);
        }
    }

    Ok(())
}
