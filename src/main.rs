use anyhow::{Context, Result};
use bankdata_pipeline::{ingest_payload_file, run_pipeline, validate_extracts, PipelineSettings};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bankdata-pipeline", version, about = "Normalize bank transaction extracts")]
struct Cli {
    /// TOML settings file (BANKDATA_* environment variables still win)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the storage root (extracts/ and analysis/ live under it)
    #[arg(long, global = true)]
    storage_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the dataset, write the CSV and the key validation report
    Run,

    /// Build the dataset and print the key validation report (writes nothing)
    Validate,

    /// Copy a downloaded transactions payload into the extracts directory
    Ingest {
        /// JSON payload as returned by the transactions endpoint
        payload: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout only carries JSON output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings =
        PipelineSettings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(root) = cli.storage_root {
        settings.storage_root = root;
    }

    match cli.command {
        Command::Run => {
            let artifacts = run_pipeline(&settings).context("Pipeline run failed")?;
            println!("{}", serde_json::to_string_pretty(&artifacts)?);
        }

        Command::Validate => {
            let report = validate_extracts(&settings).context("Key validation failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Ingest { payload } => {
            let path = ingest_payload_file(&payload, &settings.extracts_dir())
                .with_context(|| format!("Failed to ingest {}", payload.display()))?;
            info!("Extract stored as {}", path.display());
            println!("{}", path.display());
        }
    }

    Ok(())
}
