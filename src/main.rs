mod apcc;
mod appm;
mod astro;
mod cancel;
mod config;
mod instructions;
mod model;
mod process;
mod sequence;

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::instructions::ExecutionContext;
use crate::sequence::{Runner, Sequence};

#[derive(Parser)]
#[command(name = "aptools")]
#[command(about = "Unattended Astro-Physics mount modeling and parking")]
struct Cli {
    /// Path to the tool configuration file
    #[arg(long, default_value = "aptools.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a sequence file against the configuration
    Validate { sequence: String },
    /// Execute a sequence file
    Run { sequence: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let sequence_path = match &cli.command {
        Commands::Validate { sequence } | Commands::Run { sequence } => sequence.clone(),
    };
    let (config, seq) = match load(&cli.config, &sequence_path) {
        Ok(loaded) => loaded,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Validate { .. } => validate(&config, &seq),
        Commands::Run { .. } => run(config, seq).await,
    }
}

fn load(config_path: &Path, sequence_path: &str) -> Result<(Config, Sequence), String> {
    let config = Config::from_file(config_path)
        .map_err(|e| format!("Error reading config {}: {}", config_path.display(), e))?;

    let yaml =
        fs::read_to_string(sequence_path).map_err(|e| format!("Error reading file: {}", e))?;
    let seq = Sequence::from_str(&yaml).map_err(|e| format!("Parse error: {}", e))?;

    Ok((config, seq))
}

fn validate(config: &Config, seq: &Sequence) -> ExitCode {
    let mut issue_count = 0;
    for (i, step) in seq.steps.iter().enumerate() {
        let time_str = match &step.time {
            Some(t) => t.to_string(),
            None => "immediate".to_string(),
        };
        println!("  {}: {} @ {}", i + 1, step.instruction.name(), time_str);

        for issue in step.instruction.validate(config) {
            println!("     issue: {issue}");
            issue_count += 1;
        }
    }

    if issue_count > 0 {
        eprintln!("{issue_count} issue(s) found");
        return ExitCode::FAILURE;
    }
    println!("Sequence is valid ({} steps)", seq.steps.len());
    ExitCode::SUCCESS
}

async fn run(config: Config, seq: Sequence) -> ExitCode {
    let mut issues = Vec::new();
    for (i, step) in seq.steps.iter().enumerate() {
        for issue in step.instruction.validate(&config) {
            issues.push(format!("step {}: {}", i + 1, issue));
        }
    }
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("{issue}");
        }
        return ExitCode::FAILURE;
    }

    let (cancel_src, cancel) = cancel::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received, cancelling sequence");
            cancel_src.cancel();
        }
    });

    let runner = Runner {
        sequence: seq,
        ctx: ExecutionContext { config, cancel },
    };

    match runner.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
