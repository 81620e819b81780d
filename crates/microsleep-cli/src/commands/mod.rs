//! CLI command definitions and handlers.

pub mod models;
pub mod predict;
pub mod serve;

use clap::{Parser, Subcommand};

/// Microsleep - drowsiness classification from face images
#[derive(Parser)]
#[command(name = "microsleep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared predict arguments (paths, thresholds, flags).
    #[command(flatten)]
    pub predict: predict::PredictArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the classifier over HTTP
    Serve(serve::ServeArgs),
    /// Classify image files and print JSON records
    Predict(predict::PredictArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every image classified NORMAL (or the command succeeded).
    Success,
    /// At least one image classified MICROSLEEP.
    MicrosleepDetected,
    /// A failure occurred.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::MicrosleepDetected => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
