//! Serve command - run the HTTP prediction service.

use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Args;
use microsleep_adapters::{load_service, ModelStore};
use microsleep_core::inference::FaceMeshConfig;
use microsleep_server::{ServerOptions, DEFAULT_MAX_UPLOAD_BYTES};
use tracing::info;

use super::predict::parse_threshold;
use crate::config::AppConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Arguments for the serve command.
#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Maximum number of predictions running at once
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Maximum accepted upload size in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Minimum face detection confidence (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub min_face_confidence: Option<f32>,

    /// Minimum face presence probability (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub min_presence: Option<f32>,
}

impl ServeArgs {
    /// Resolve server options: CLI flags, then config, then defaults.
    pub fn resolve(&self, config: &AppConfig) -> Result<ServerOptions> {
        let host = self
            .host
            .clone()
            .or_else(|| config.server.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let max_concurrency = self
            .max_concurrency
            .or(config.server.max_concurrency)
            .unwrap_or_else(default_concurrency);
        if max_concurrency == 0 {
            anyhow::bail!("--max-concurrency must be at least 1");
        }

        Ok(ServerOptions {
            host,
            port: self.port.or(config.server.port).unwrap_or(DEFAULT_PORT),
            max_concurrency,
            max_upload_bytes: self
                .max_upload_bytes
                .or(config.server.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }

    fn detector_config(&self, config: &AppConfig) -> FaceMeshConfig {
        let defaults = FaceMeshConfig::default();
        FaceMeshConfig {
            min_face_confidence: self
                .min_face_confidence
                .or(config.detector.min_face_confidence)
                .unwrap_or(defaults.min_face_confidence),
            min_presence: self
                .min_presence
                .or(config.detector.min_presence)
                .unwrap_or(defaults.min_presence),
        }
    }
}

fn default_concurrency() -> usize {
    thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Run the serve command until interrupted.
pub fn run(args: &ServeArgs, config: &AppConfig) -> Result<()> {
    let options = args.resolve(config)?;

    let store = args
        .models_dir
        .clone()
        .or_else(|| config.models.dir.clone())
        .map_or_else(ModelStore::default, ModelStore::new);
    info!("Loading models from {}", store.dir().display());

    let service = load_service(&store, args.detector_config(config));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(microsleep_server::serve(options, service))
}
