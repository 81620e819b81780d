//! Microsleep CLI - drowsiness classification from face images.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{predict::PredictArgs, Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();
    if let Err(e) = config.validate() {
        eprintln!("error: invalid configuration: {e}");
        return ExitCode::Error.into();
    }

    let exit_code = match cli.command {
        Some(Commands::Predict(args)) => predict(args, &config),
        Some(Commands::Serve(ref args)) => report(commands::serve::run(args, &config)),
        Some(Commands::Models(ref args)) => report(commands::models::run(args, &config)),
        None => {
            // Default behavior: predict with flattened args
            if cli.predict.paths.is_empty() {
                eprintln!("error: No paths specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            predict(cli.predict, &config)
        }
    };

    exit_code.into()
}

fn predict(args: PredictArgs, config: &AppConfig) -> ExitCode {
    let args = PredictArgs::with_config(args, config);
    match commands::predict::run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}

fn report(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}
