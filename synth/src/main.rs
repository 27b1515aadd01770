use clap::{Args, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod snapshot;
mod telemetry;

use config::Config;
use snapshot::Snapshot;

#[derive(Parser)]
#[command(name = "synth", about = "Synthesizes backend configuration from ingress annotations")]
enum CliCommand {
    /// Resolves every backend of a snapshot and prints it as JSON
    Render(RenderArgs),
    /// Loads and validates a config file
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
struct RenderArgs {
    #[arg(long)]
    config: PathBuf,
    #[arg(long)]
    snapshot: PathBuf,
}

#[derive(Args)]
struct CheckConfigArgs {
    #[arg(long)]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match &cli {
        CliCommand::Render(args) => render(args),
        CliCommand::CheckConfig(args) => match Config::from_file(&args.config) {
            Ok(_) => {
                println!("{}: ok", args.config.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {e}", args.config.display());
                ExitCode::FAILURE
            }
        },
    }
}

fn render(args: &RenderArgs) -> ExitCode {
    let config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let logging = config.common.logging.clone().unwrap_or_default();
    let _sentry = telemetry::init_logging(&logging);
    if let Some(metrics) = &config.common.metrics
        && let Err(e) = telemetry::init_metrics(metrics)
    {
        tracing::warn!(error = %e, "metrics disabled");
    }

    let rendered = Snapshot::from_file(&args.snapshot)
        .and_then(|snapshot| snapshot.render(config.annotations));
    let rendered = match rendered {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::error!(snapshot = %args.snapshot.display(), "{e}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&rendered) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("could not serialize backends: {e}");
            ExitCode::FAILURE
        }
    }
}
