//! erdm CLI - Build entity-relationship models from schema metadata
//!
//! Usage:
//!   erdm analyze [--config <file>] [--source <path>] [--kind <kind>] [--output <path>]
//!   erdm check [--source <path>] [--strict]
//!
//! Examples:
//!   erdm analyze --source ./app.db --kind sqlite --output erd.json
//!   erdm analyze --config erdm.toml --format sqlite --output erd.db
//!   erdm check --source rows.json --naming lower --strict

use clap::{Args, Parser, Subcommand, ValueEnum};
use erdm::analyzer::{LogSink, SchemaAnalyzer};
use erdm::config::{OutputFormat, Settings, SourceKind};
use erdm::metadata::{JsonRowSource, RowSource, SqliteRowSource};
use erdm::naming::NamingConvention;
use erdm::store::{GraphStore, JsonGraphStore, SqliteGraphStore};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "erdm")]
#[command(about = "erdm - Entity-relationship models from relational schema metadata")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and commit it to the configured store
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Output path (JSON file or SQLite database)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long)]
        format: Option<FormatArg>,
    },

    /// Build the graph and print it without committing
    Check {
        #[command(flatten)]
        input: InputArgs,

        /// Exit with failure when any reference is unresolved
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Path to a config file (defaults to ERDM_CONFIG or ./erdm.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Row source path
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Row source kind
    #[arg(short, long)]
    kind: Option<KindArg>,

    /// Identifier naming convention
    #[arg(short, long)]
    naming: Option<NamingArg>,
}

#[derive(Clone, ValueEnum)]
enum KindArg {
    /// JSON array of metadata rows
    Json,
    /// SQLite database file
    Sqlite,
}

impl From<KindArg> for SourceKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Json => SourceKind::Json,
            KindArg::Sqlite => SourceKind::Sqlite,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum NamingArg {
    Preserve,
    Lower,
    Upper,
    Snake,
    Singular,
    Plural,
}

impl From<NamingArg> for NamingConvention {
    fn from(arg: NamingArg) -> Self {
        match arg {
            NamingArg::Preserve => NamingConvention::Preserve,
            NamingArg::Lower => NamingConvention::Lower,
            NamingArg::Upper => NamingConvention::Upper,
            NamingArg::Snake => NamingConvention::Snake,
            NamingArg::Singular => NamingConvention::Singular,
            NamingArg::Plural => NamingConvention::Plural,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum FormatArg {
    /// Single JSON document
    Json,
    /// SQLite database keeping run history
    Sqlite,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sqlite => OutputFormat::Sqlite,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            format,
        } => cmd_analyze(input, output, format).await,
        Commands::Check { input, strict } => cmd_check(input, strict).await,
    }
}

/// Load settings and apply command-line overrides.
fn load_settings(input: &InputArgs) -> Result<Settings, String> {
    let mut settings = match &input.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
    .map_err(|e| e.to_string())?;

    if let Some(source) = &input.source {
        settings.source.path = Some(source.display().to_string());
    }
    if let Some(kind) = &input.kind {
        settings.source.kind = kind.clone().into();
    }
    if let Some(naming) = &input.naming {
        settings.naming.convention = naming.clone().into();
    }
    Ok(settings)
}

fn build_analyzer(settings: &Settings) -> Result<SchemaAnalyzer<Box<dyn RowSource>>, String> {
    let path = settings.source.resolved_path().map_err(|e| e.to_string())?;
    let source: Box<dyn RowSource> = match settings.source.kind {
        SourceKind::Json => Box::new(JsonRowSource::new(path)),
        SourceKind::Sqlite => Box::new(SqliteRowSource::new(path)),
    };
    Ok(SchemaAnalyzer::new(source).with_convention(settings.naming.convention))
}

async fn cmd_analyze(
    input: InputArgs,
    output: Option<PathBuf>,
    format: Option<FormatArg>,
) -> ExitCode {
    let mut settings = match load_settings(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(output) = output {
        settings.output.path = Some(output.display().to_string());
    }
    if let Some(format) = format {
        settings.output.format = format.into();
    }

    let analyzer = match build_analyzer(&settings) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output_path = match settings.output.resolved_path() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut store: Box<dyn GraphStore> = match settings.output.format {
        OutputFormat::Json => Box::new(JsonGraphStore::new(&output_path)),
        OutputFormat::Sqlite => match SqliteGraphStore::open(&output_path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                eprintln!("Error opening store '{}': {}", output_path.display(), e);
                return ExitCode::FAILURE;
            }
        },
    };

    let mut sink = LogSink;
    match analyzer.analyze(store.as_mut(), &mut sink).await {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_check(input: InputArgs, strict: bool) -> ExitCode {
    let settings = match load_settings(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let analyzer = match build_analyzer(&settings) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let analysis = match analyzer.analyze_only().await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Source: {}\n", analyzer.source().describe());
    print!("{}", analysis.graph.render());
    println!(
        "\n{} entities, {} columns, {} relationships",
        analysis.graph.entity_count(),
        analysis.graph.column_count(),
        analysis.graph.relationship_count()
    );

    if analysis.warnings.is_empty() {
        println!("✓ All references resolved");
        return ExitCode::SUCCESS;
    }

    println!("\n{} unresolved reference(s):", analysis.warnings.len());
    for warning in &analysis.warnings {
        println!("  - {}", warning);
    }

    if strict {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
