use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;
use symptom_triage::utils::logging::{print_category_counts, print_elapsed, print_schema_summary};
use symptom_triage::{
    TriageConfig, evaluate_from_config, load_engine_async, orchestrate_with_timeout,
    train_from_config,
};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

#[derive(Parser)]
#[command(name = "symptom-triage")]
#[command(about = "Route free-text symptom descriptions to a medical specialist", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the balanced training set, train the classifier and write its artifacts
    Train {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Measure category accuracy on the held-out dataset
    Evaluate {
        #[command(flatten)]
        config: ConfigArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Triage one symptom description
    Predict {
        #[command(flatten)]
        config: ConfigArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Override the configured classifier timeout
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Symptom description
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<TriageConfig> {
        TriageConfig::load(self.config.as_deref()).with_context(|| match &self.config {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to build default configuration".to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Train { config } => {
            let config = config.load()?;
            let summary = tokio::task::spawn_blocking(move || train_from_config(&config))
                .await
                .context("Training task panicked")?
                .context("Training failed")?;

            print_category_counts("Balanced training set", &summary.category_counts);
            print_schema_summary(&summary.artifacts.schema, 10);
            println!(
                "Trained {} trees on {} of {} rows",
                summary.artifacts.model.tree_count(),
                summary.training_rows,
                summary.source_rows
            );
            println!("Schema written to {}", summary.schema_path.display());
            println!("Model written to {}", summary.model_path.display());
            print_elapsed("Training finished", summary.elapsed);
        }

        Commands::Evaluate { config, json } => {
            let config = config.load()?;
            let start = Instant::now();
            let report = tokio::task::spawn_blocking(move || evaluate_from_config(&config))
                .await
                .context("Evaluation task panicked")?
                .context("Evaluation failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
                print_elapsed("Evaluation finished", start.elapsed());
            }
        }

        Commands::Predict {
            config,
            json,
            timeout_ms,
            text,
        } => {
            let config = config.load()?;
            let timeout = timeout_ms
                .map_or_else(|| config.inference_timeout(), Duration::from_millis);
            let text = text.join(" ");

            let engine = load_engine_async(config)
                .await
                .context("Failed to load the triage engine")?;
            info!("Triage engine loaded; classifying input");
            let result = orchestrate_with_timeout(engine, text, timeout)
                .await
                .context("Triage failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{result}");
            }
        }
    }

    Ok(())
}
