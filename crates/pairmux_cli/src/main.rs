//! pairmux - batch fetch, normalize, overlay and concatenate media pairs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};

use pairmux_core::config::ConfigManager;
use pairmux_core::logging::{init_tracing, LogConfig, LogLevel, RunLogger};
use pairmux_core::models::{BatchResult, Manifest, PairResult};
use pairmux_core::orchestrator::{BatchError, BatchProcessor};
use pairmux_core::tools::ProcessTools;

const DEFAULT_CONFIG: &str = "pairmux.toml";

#[derive(Parser)]
#[command(
    name = "pairmux",
    version,
    about = "Fetch video/image pairs, overlay each image, and join the results",
    after_help = "EXAMPLES:\n  \
                  pairmux init-config\n  \
                  pairmux run --manifest input.json\n  \
                  pairmux run --manifest input.json --workers 2 --output ./out -v"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every pair of a manifest and publish the joined video
    Run(RunArgs),

    /// Write a commented default configuration file
    InitConfig {
        /// Configuration file path
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON input record with the `files` (or `arquivos`) pair list
    #[arg(long)]
    manifest: PathBuf,

    /// Configuration file path (created with defaults if missing)
    #[arg(long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Number of pairs processed concurrently
    #[arg(long)]
    workers: Option<usize>,

    /// Staging directory for intermediates
    #[arg(long)]
    temp: Option<PathBuf>,

    /// Directory for segments and the published video
    #[arg(long)]
    output: Option<PathBuf>,

    /// Keep raw and normalized files after each pair
    #[arg(long)]
    keep_intermediates: bool,

    /// Skip the PNG/JPEG signature check on images
    #[arg(long)]
    no_verify_images: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    init_tracing(level);

    let outcome = match cli.command {
        Commands::InitConfig { config } => init_config(&config),
        Commands::Run(args) => run(args, level),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_config(path: &Path) -> Result<ExitCode> {
    let mut config = ConfigManager::new(path);
    config
        .load_or_create()
        .with_context(|| format!("Failed to initialize {}", path.display()))?;
    println!("Configuration at {}", config.path().display());
    Ok(ExitCode::SUCCESS)
}

fn run(args: RunArgs, level: LogLevel) -> Result<ExitCode> {
    let mut config = ConfigManager::new(&args.config);
    config
        .load_or_create()
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let mut settings = config.into_settings();

    if let Some(workers) = args.workers {
        settings.pipeline.workers = workers;
    }
    if let Some(temp) = args.temp {
        settings.paths.temp_root = temp.to_string_lossy().to_string();
    }
    if let Some(output) = args.output {
        settings.paths.output_folder = output.to_string_lossy().to_string();
    }
    if args.keep_intermediates {
        settings.pipeline.keep_intermediates = true;
    }
    if args.no_verify_images {
        settings.validation.verify_image_signature = false;
    }

    let manifest = Manifest::from_json_file(&args.manifest)
        .with_context(|| format!("Invalid manifest {}", args.manifest.display()))?;
    if let Some(url) = &manifest.stream_url {
        tracing::info!("Manifest names stream target {} (not used by this tool)", url);
    }

    let run_name = args
        .manifest
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "batch".to_string());
    let log_config = LogConfig::from_settings(&settings.logging, level);
    let logger = Arc::new(
        RunLogger::new(&run_name, &settings.paths.logs_folder, log_config, None)
            .with_context(|| format!("Failed to create log in {}", settings.paths.logs_folder))?,
    );

    let tools = Arc::new(ProcessTools::from_settings(&settings));
    let processor = BatchProcessor::new(settings, tools, Arc::clone(&logger));

    let result = processor.run(&manifest);
    logger.close();

    match result {
        Ok(result) => {
            print_summary(&result);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if let Some(partial) = e.partial_result() {
                print_summary(partial);
            }
            if matches!(e, BatchError::Setup(_)) {
                return Err(e.into());
            }
            eprintln!("Error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_summary(result: &BatchResult) {
    for outcome in &result.outcomes {
        match &outcome.result {
            PairResult::Success { final_path } => {
                println!("  ok    {}  {}", outcome.pair_id, final_path.display());
            }
            PairResult::Failure { stage, reason } => {
                println!("  fail  {}  [{}] {}", outcome.pair_id, stage, reason);
            }
        }
    }
    println!(
        "{} of {} pairs succeeded",
        result.succeeded(),
        result.outcomes.len()
    );
    if let Some(path) = &result.final_artifact_path {
        println!("Published {}", path.display());
    }
}
