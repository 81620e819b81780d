//! Predict command - classify images in-process.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use microsleep_adapters::{load_service, FsImageSource, ModelStore};
use microsleep_core::inference::FaceMeshConfig;
use microsleep_core::{predict_batch, BatchSummary, ImageSource};
use tracing::{debug, info};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Parse and validate a threshold value (0.0-1.0).
pub fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Arguments for batch prediction.
#[derive(Args, Clone)]
pub struct PredictArgs {
    /// Files or directories to classify
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Minimum face detection confidence (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub min_face_confidence: Option<f32>,

    /// Minimum face presence probability (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub min_presence: Option<f32>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,
}

impl PredictArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        args.min_face_confidence = args
            .min_face_confidence
            .or(config.detector.min_face_confidence);
        args.min_presence = args.min_presence.or(config.detector.min_presence);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }

        args
    }

    /// Detector thresholds with fallback to hardcoded defaults.
    pub fn detector_config(&self) -> FaceMeshConfig {
        let defaults = FaceMeshConfig::default();
        FaceMeshConfig {
            min_face_confidence: self
                .min_face_confidence
                .unwrap_or(defaults.min_face_confidence),
            min_presence: self.min_presence.unwrap_or(defaults.min_presence),
        }
    }

    /// Model store from `--models-dir` or the default location.
    pub fn model_store(&self) -> ModelStore {
        self.models_dir
            .as_ref()
            .map_or_else(ModelStore::default, ModelStore::new)
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }
}

/// Maps batch counts and service readiness to an exit status.
///
/// Errors outrank detections. A service without models is an error even
/// when no image produced a record.
pub const fn exit_code_for(summary: &BatchSummary, ready: bool) -> ExitCode {
    if !ready || summary.has_errors() {
        ExitCode::Error
    } else if summary.microsleep > 0 {
        ExitCode::MicrosleepDetected
    } else {
        ExitCode::Success
    }
}

/// Run the predict command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &PredictArgs) -> Result<ExitCode> {
    info!("Running predict command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let store = args.model_store();
    debug!("Using models directory: {}", store.dir().display());
    let service = load_service(&store, args.detector_config());

    let source = FsImageSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let output = match args.format() {
        OutputFormat::Jsonl => JsonOutput::stdout(),
        OutputFormat::Json => JsonOutput::stdout_array(args.pretty),
    };

    let summary = predict_batch(&source, &service, &output, &progress, &iso_timestamp)?;
    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        microsleep = summary.microsleep,
        "Predict complete"
    );

    Ok(exit_code_for(&summary, service.is_ready()))
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
