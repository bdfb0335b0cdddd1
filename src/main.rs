use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};

use dejatext::{Checks, Engine, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "dejatext")]
#[command(about = "Find repeated text across a document tree and redact it in a mirrored copy")]
#[command(version)]
struct Args {
    /// Directory containing the .txt and .md documents to clean up
    input_dir: PathBuf,

    /// Where the cleaned mirror of the input is written
    #[arg(long, default_value = "cleanup_output")]
    output_folder: PathBuf,

    /// Do not delete whole-file duplicates
    #[arg(long)]
    no_check_files: bool,

    /// Do not redact duplicate paragraphs
    #[arg(long)]
    no_check_paragraphs: bool,

    /// Do not redact duplicate sentences
    #[arg(long)]
    no_check_sentences: bool,

    /// Per-document processing budget in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Glob (relative to the output root) of documents to leave untouched; repeatable
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Write run stats as JSON to this path
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_folder.clone(),
            checks: Checks {
                files: !self.no_check_files,
                paragraphs: !self.no_check_paragraphs,
                sentences: !self.no_check_sentences,
            },
            document_timeout: Duration::from_secs(self.timeout_secs),
            exclude: self.exclude.clone(),
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let engine = Engine::new(args.engine_config())?;
    let summary = engine.run().await?;

    println!("{}", summary.summary_line());
    if let Some(stats_out) = &args.stats_out {
        summary.write_json(stats_out).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // WHY: structured JSON logging on stderr keeps stdout for the summary line
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("Starting dejatext");
    info!(?args, "Parsed CLI arguments");

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
