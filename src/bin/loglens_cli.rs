use std::path::{Path, PathBuf};
use std::sync::Arc;
use structopt::StructOpt;

use loglens::config::Config;
use loglens::input::read_log_file;
use loglens::output::{OutputFormat, OutputHandler};
use loglens::{AnomalyService, EventSequence, ModelHandle, SqliteTelemetryStore};

/// Log sequence anomaly scoring command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "loglens", about = "Log sequence anomaly scoring")]
struct Cli {
    /// Path to configuration file
    #[structopt(short, long, default_value = "loglens.toml", global = true)]
    config: PathBuf,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt, Debug)]
enum Command {
    /// Score one batch of log events
    Predict {
        /// File holding the batch
        #[structopt(short, long)]
        file: PathBuf,
        /// Input format: "json" ({"logs": [...]} payload) or "lines" (plain log lines)
        #[structopt(long, default_value = "json")]
        format: String,
    },
    /// Print the token block a batch is reduced to
    Tokenize {
        #[structopt(short, long)]
        file: PathBuf,
        #[structopt(long, default_value = "json")]
        format: String,
    },
    /// Show request history, newest first
    History,
    /// Show latency and input size statistics
    Stats,
    /// Delete all request history
    ClearHistory {
        /// Confirm the irreversible deletion
        #[structopt(long)]
        yes: bool,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "loglens.toml")]
        output: PathBuf,
    },
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if path.exists() {
        Config::from_file(path)?
    } else {
        log::warn!("Config file {:?} not found, using defaults", path);
        Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

fn build_service(config: &Config, preload: bool) -> Result<AnomalyService, Box<dyn std::error::Error>> {
    let model = Arc::new(ModelHandle::new(&config.model.artifact_path));
    if preload {
        if let Err(e) = model.preload() {
            log::error!("Model preload failed, predictions will be refused: {}", e);
        }
    }
    let store = Arc::new(SqliteTelemetryStore::new(&config.telemetry.database_path)?);
    Ok(AnomalyService::new(model, store))
}

fn open_output(config: &Config) -> Result<OutputHandler, Box<dyn std::error::Error>> {
    Ok(OutputHandler::new(
        OutputFormat::parse(&config.output.format),
        config.output.file_path.clone(),
    )?)
}

fn read_sequence(file: &Path, format: &str) -> Result<EventSequence, Box<dyn std::error::Error>> {
    match format {
        "lines" => Ok(EventSequence::new(read_log_file(file)?)?),
        _ => Ok(loglens::input::parse_payload(&std::fs::read_to_string(file)?)?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::from_args();

    match cli.command {
        Command::Config { output } => {
            Config::default().to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Command::Predict { file, format } => {
            let config = load_config(&cli.config)?;
            let mut output = open_output(&config)?;
            let service = build_service(&config, config.model.preload)?;
            let outcome = match format.as_str() {
                "lines" => service.predict(read_log_file(&file)?).await?,
                "json" => service.predict_payload(&std::fs::read_to_string(&file)?).await?,
                other => return Err(format!("unknown input format: {}", other).into()),
            };
            output.write_outcome(&outcome)?;
            output.flush()?;
        }
        Command::Tokenize { file, format } => {
            let config = load_config(&cli.config)?;
            let mut output = open_output(&config)?;
            let sequence = read_sequence(&file, &format)?;
            output.write_line(&loglens::tokenize_sequence(&sequence))?;
            output.flush()?;
        }
        Command::History => {
            let config = load_config(&cli.config)?;
            let mut output = open_output(&config)?;
            let service = build_service(&config, false)?;
            output.write_history(&service.history()?)?;
            output.flush()?;
        }
        Command::Stats => {
            let config = load_config(&cli.config)?;
            let mut output = open_output(&config)?;
            let service = build_service(&config, false)?;
            output.write_stats(&service.stats()?)?;
            output.flush()?;
        }
        Command::ClearHistory { yes } => {
            if !yes {
                eprintln!("Refusing to delete history without --yes");
                std::process::exit(1);
            }
            let config = load_config(&cli.config)?;
            let mut output = open_output(&config)?;
            let service = build_service(&config, false)?;
            let removed = service.clear_history()?;
            output.write_line(&format!("Deleted {} record(s)", removed))?;
            output.flush()?;
        }
    }

    Ok(())
}
