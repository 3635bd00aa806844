#![forbid(unsafe_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use hof_harness::capabilities::{self, CapabilityError, HallOfFameCapabilities};
use hof_harness::config::HarnessConfig;
use hof_harness::PlayerRecord;

#[derive(Parser)]
#[command(name = "hof", version, about = "Baseball Hall of Fame capability harness")]
struct Cli {
    /// Statistics table (CSV)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Model artifact
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// JSON settings file (BingSearch.APIKey, BaseUrl, DataPath, ModelPath)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a player's career statistics
    Stats {
        #[arg(long)]
        name: String,
    },
    /// Hall of Fame probability for a player in the table or a JSON record
    Predict {
        #[arg(long, group = "input")]
        name: Option<String>,

        /// Path to a JSON player record
        #[arg(long, group = "input")]
        record: Option<PathBuf>,

        /// Print label, probability and raw score instead of the probability
        #[arg(long)]
        full: bool,
    },
    /// Cited web evidence for a player
    Evidence {
        #[arg(long)]
        name: String,

        #[arg(long, value_enum, default_value = "text")]
        format: EvidenceFormat,
    },
    /// Print the capability catalog as JSON
    Catalog,
    /// Invoke a capability by catalog name with JSON arguments
    Invoke {
        #[arg(long)]
        capability: String,

        /// Inline JSON argument object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EvidenceFormat {
    Text,
    Footnotes,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<CapabilityError>() {
                Some(cap) => eprintln!("error [{}]: {cap}", cap.code()),
                None => eprintln!("error: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = HarnessConfig::from_env()?;
    if let Some(path) = &cli.settings {
        config.apply_settings_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
    }
    if let Some(path) = cli.data {
        config.data_path = path;
    }
    if let Some(path) = cli.model {
        config.model_path = path;
    }

    let caps = HallOfFameCapabilities::from_config(config)?;

    match cli.command {
        Commands::Stats { name } => {
            let record = caps.get_baseball_player_stats(&name, None).await?;
            print_json(&record)?;
        }
        Commands::Predict { name, record, full } => {
            let stats = match (name, record) {
                (Some(name), _) => caps.get_baseball_player_stats(&name, None).await?,
                (None, Some(path)) => read_json::<PlayerRecord>(&path)?,
                (None, None) => return Err("predict requires --name or --record".into()),
            };
            if full {
                print_json(&caps.predict(&stats, None).await?)?;
            } else {
                let probability = caps
                    .get_player_probability_of_hall_of_fame(&stats, None)
                    .await?;
                println!("{probability}");
            }
        }
        Commands::Evidence { name, format } => {
            let report = caps.get_web_search_evidence(&name, None).await?;
            match format {
                EvidenceFormat::Text => print!("{}", report.narrative),
                EvidenceFormat::Footnotes => print!("{}", report.footnotes),
                EvidenceFormat::Json => print_json(&report)?,
            }
        }
        Commands::Catalog => {
            print_json(&capabilities::catalog())?;
        }
        Commands::Invoke { capability, args } => {
            let args: Value = serde_json::from_str(&args)?;
            let result = caps.invoke(&capability, &args, None).await?;
            match result {
                Value::String(text) => print!("{text}"),
                other => print_json(&other)?,
            }
        }
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}
