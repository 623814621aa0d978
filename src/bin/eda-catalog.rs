//! eda-catalog CLI - derive Event entities from AsyncAPI API entities
//!
//! Runs the Event entities processor over a catalog location file and writes
//! the derived entities, or validates the Event entities a file contains.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use eda_catalog::{
    load_entities, serialization, CatalogProcessor, EventEntitiesProcessor, LocationSpec, OutputFormat,
    ProcessingResult, ProcessorConfig,
};

#[derive(Parser)]
#[command(name = "eda-catalog")]
#[command(version, about = "Derive Event entities from AsyncAPI definitions", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the processor over every entity and write the derived entities
    Process {
        /// Multi-document YAML file of catalog entities
        #[arg(short, long)]
        entities: PathBuf,

        /// Processor configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the Event entities in a file
    Validate {
        /// Multi-document YAML file of catalog entities
        #[arg(short, long)]
        entities: PathBuf,
    },
}

/// Output format flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// `---`-separated YAML documents
    Yaml,
    /// One JSON array
    Json,
    /// One JSON object per line
    Ndjson,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Yaml => OutputFormat::Yaml,
            Format::Json => OutputFormat::Json,
            Format::Ndjson => OutputFormat::Ndjson,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables before the filter reads RUST_LOG
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Process { entities, config, format, output } => {
            process_entities(entities, config, format.into(), output).await
        }
        Commands::Validate { entities } => validate_entities(entities).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ProcessorConfig, String> {
    let config = match path {
        Some(path) => ProcessorConfig::load_from_file(path).map_err(|e| e.to_string())?,
        None => ProcessorConfig::default(),
    };
    config.apply_env().map_err(|e| e.to_string())
}

/// Run `post_process_entity` over every entity and write the emitted entities
async fn process_entities(
    entities_path: PathBuf,
    config_path: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let config = load_config(config_path.as_deref())?;
    let entities = load_entities(&entities_path).map_err(|e| e.to_string())?;
    tracing::info!(count = entities.len(), path = %entities_path.display(), "loaded entities");

    let processor = EventEntitiesProcessor::new(config);
    let location = LocationSpec::new("file", entities_path.display().to_string());

    let mut emitted: Vec<ProcessingResult> = Vec::new();
    for entity in entities {
        processor
            .post_process_entity(entity, &location, &mut emitted)
            .await
            .map_err(|e| e.to_string())?;
    }

    let derived: Vec<_> = emitted.into_iter().filter_map(ProcessingResult::into_entity).collect();
    tracing::info!(count = derived.len(), "derived event entities");

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(File::create(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))?),
        None => Box::new(io::stdout().lock()),
    };
    serialization::write_all(BufWriter::new(writer), format, &derived).map_err(|e| e.to_string())
}

/// Run `validate_entity_kind` over every entity and report one line each
async fn validate_entities(entities_path: PathBuf) -> Result<(), String> {
    let entities = load_entities(&entities_path).map_err(|e| e.to_string())?;
    let processor = EventEntitiesProcessor::default();

    let mut failures = 0usize;
    for entity in &entities {
        let reference = entity.compound_ref();
        match processor.validate_entity_kind(entity).await {
            Ok(true) => println!("ok     {}", reference),
            Ok(false) => println!("skip   {}", reference),
            Err(e) => {
                failures += 1;
                println!("error  {}: {}", reference, e);
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} entities failed validation", failures, entities.len()));
    }
    Ok(())
}
