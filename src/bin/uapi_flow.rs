use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uapi_flow::{
    classify_capture, normalize_capture, summarize, FlowConfig, LoggingConfig, Profile,
    ResponseKind,
};

#[derive(Parser, Debug)]
#[command(
    name = "uapi-flow",
    version,
    about = "Inspect captured uAPI documents and terminal screens"
)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, short, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize a captured response document into its canonical record.
    Normalize {
        /// Response shape, e.g. universal_record, tickets, pnr_list.
        #[arg(value_parser = parse_kind)]
        kind: ResponseKind,
        file: PathBuf,
    },
    /// Classify a captured fault document.
    Classify {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = ProfileArg::General)]
        profile: ProfileArg,
    },
    /// Extract locators and segment lines from a terminal screen.
    Screen { file: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    General,
    TicketRetrieval,
    PnrList,
    Ticketing,
    Booking,
}

impl From<ProfileArg> for Profile {
    fn from(value: ProfileArg) -> Self {
        match value {
            ProfileArg::General => Profile::General,
            ProfileArg::TicketRetrieval => Profile::TicketRetrieval,
            ProfileArg::PnrList => Profile::PnrList,
            ProfileArg::Ticketing => Profile::Ticketing,
            ProfileArg::Booking => Profile::Booking,
        }
    }
}

fn parse_kind(value: &str) -> Result<ResponseKind, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FlowConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FlowConfig::default(),
    };
    init_tracing(&config.logging);

    let output = match cli.command {
        Command::Normalize { kind, file } => {
            let record = normalize_capture(&read(&file)?, kind, &config.normalize)?;
            serde_json::to_string_pretty(&record)?
        }
        Command::Classify { file, profile } => {
            let verdict =
                classify_capture(&read(&file)?, profile.into(), &config.normalize.schema)?;
            match verdict {
                Some(err) => serde_json::to_string_pretty(&err)?,
                None => "null".to_string(),
            }
        }
        Command::Screen { file } => serde_json::to_string_pretty(&summarize(&read(&file)?))?,
    };
    println!("{output}");
    Ok(())
}
