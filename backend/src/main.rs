//! Rowfold CLI - validate delimited records and fold them into grouped JSON
//!
//! # Commands
//!
//! ```bash
//! rowfold run -n sales-summary -f sales.csv      # Full run: validate, group, write, store
//! rowfold check -n sales-summary -f sales.csv    # Validation only; exit 1 on rejects
//! rowfold transforms                             # List transform configs
//! rowfold show -n sales-summary                  # Print a resolved transform config
//! ```
//!
//! The application config is read from `-c`, `ROWFOLD_CONFIG`, or
//! `config/app.yaml`.

use clap::{Parser, Subcommand};
use rowfold::store::{open_store, persist_run};
use rowfold::telemetry::init_tracing;
use rowfold::{
    render_json, write_json, AppConfig, Pipeline, PipelineResult, TransformRegistry,
};
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Parser)]
#[command(name = "rowfold")]
#[command(about = "Validate delimited records and fold them into grouped JSON", long_about = None)]
struct Cli {
    /// Application config file
    #[arg(
        short,
        long,
        global = true,
        env = "ROWFOLD_CONFIG",
        default_value = "config/app.yaml"
    )]
    config: PathBuf,

    /// Log level (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, expand, group and fold a source file
    Run {
        /// Transform name
        #[arg(short, long)]
        name: String,

        /// Source file
        #[arg(short = 'f', long = "file")]
        source: PathBuf,

        /// Output file (default: transform's output_file, else stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the document store
        #[arg(long)]
        no_store: bool,
    },

    /// Validate a source file and list rejected rows
    Check {
        /// Transform name
        #[arg(short, long)]
        name: String,

        /// Source file
        #[arg(short = 'f', long = "file")]
        source: PathBuf,
    },

    /// List available transforms
    Transforms,

    /// Show a resolved transform config
    Show {
        /// Transform name
        #[arg(short, long)]
        name: String,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> PipelineResult<()> {
    let mut app = AppConfig::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        app.logging.log_level = level;
    }
    if cli.json_logs {
        app.logging.json = true;
    }
    init_tracing(&app.logging)?;

    let registry = TransformRegistry::with_dir(&app.transforms_dir);

    match cli.command {
        Commands::Run {
            name,
            source,
            output,
            no_store,
        } => cmd_run(&app, &registry, &name, &source, output.as_deref(), no_store),

        Commands::Check { name, source } => cmd_check(&registry, &name, &source),

        Commands::Transforms => cmd_transforms(&registry),

        Commands::Show { name } => cmd_show(&registry, &name),
    }
}

fn cmd_run(
    app: &AppConfig,
    registry: &TransformRegistry,
    name: &str,
    source: &Path,
    output: Option<&Path>,
    no_store: bool,
) -> PipelineResult<()> {
    eprintln!("📄 Processing: {} with transform '{}'", source.display(), name);

    let config = registry.load(name)?;
    let output = output.map(Path::to_path_buf).or_else(|| config.output_file.clone());
    let pipeline = Pipeline::new(config);
    let outcome = pipeline.run_file(source)?;

    let summary = &outcome.summary;
    eprintln!("   Records: {}", summary.ingested);
    eprintln!("   ✅ Accepted: {}", summary.accepted);
    if summary.rejected > 0 {
        eprintln!("   ❌ Rejected: {}", summary.rejected);
    }
    eprintln!("   📦 Groups: {} ({} leaf records)", summary.groups, summary.leaf_records);

    match output {
        Some(path) => {
            write_json(&outcome.tree, &path)?;
            eprintln!("   💾 Saved to: {}", path.display());
        }
        None => print!("{}", render_json(&outcome.tree)?),
    }

    match (&app.store, no_store) {
        (Some(store_config), false) => {
            let mut store = open_store(store_config)?;
            let run_id = persist_run(store.as_mut(), &outcome)?;
            eprintln!("   🗄️  Stored run {} in {}", run_id, store.describe());
        }
        (Some(_), true) => eprintln!("   Store skipped (--no-store)"),
        (None, _) => {}
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_check(registry: &TransformRegistry, name: &str, source: &Path) -> PipelineResult<()> {
    eprintln!("🔍 Checking: {} with transform '{}'", source.display(), name);

    let config = registry.load(name)?;
    let parsed = rowfold::read_source(source, &config.source_fields, config.delimiter)?;
    let pipeline = Pipeline::new(config);
    let part = pipeline.validate(&parsed.table);

    eprintln!("   Records: {}", parsed.table.len());
    eprintln!("   ✅ Accepted: {}", part.accepted.len());

    if part.rejected.is_empty() {
        eprintln!("   All records valid!");
        return Ok(());
    }

    eprintln!("   ❌ Rejected: {}", part.rejected.len());
    for row in &part.rejected {
        eprintln!("\n   Row {} ({} columns):", row.id, row.column_count);
        for message in &row.error_messages {
            eprintln!("     - {}", message);
        }
    }
    std::process::exit(1);
}

fn cmd_transforms(registry: &TransformRegistry) -> PipelineResult<()> {
    let names = registry.list();
    if names.is_empty() {
        eprintln!("No transforms in {}", registry.dir().display());
        return Ok(());
    }

    eprintln!("📋 Transforms in {}:", registry.dir().display());
    for name in names {
        match registry.load(&name) {
            Ok(config) => println!(
                "{:<24} {} fields, group by {}",
                name,
                config.source_fields.len(),
                config.group_by.join(" → ")
            ),
            Err(e) => println!("{:<24} (invalid: {})", name, e),
        }
    }
    Ok(())
}

fn cmd_show(registry: &TransformRegistry, name: &str) -> PipelineResult<()> {
    let config = registry.load(name)?;
    print!("{}", render_json(&config)?);
    Ok(())
}
