//! Models command - manage ML models.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use microsleep_adapters::{FetchEvent, ModelStore};

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download missing models
    Fetch {
        /// Base URL the artifacts are served from
        #[arg(long)]
        base_url: Option<String>,
    },
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let store = args
        .models_dir
        .clone()
        .or_else(|| config.models.dir.clone())
        .map_or_else(ModelStore::default, ModelStore::new);

    match &args.command {
        ModelsCommand::Fetch { base_url } => {
            let Some(base_url) = base_url.as_deref().or(config.models.base_url.as_deref()) else {
                anyhow::bail!(
                    "No download location configured. Pass --base-url or set models.base_url, \
                     or copy the artifacts into {}",
                    store.dir().display()
                );
            };
            fetch_models(&store, base_url)
        }
        ModelsCommand::List => {
            list_models(&store);
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", store.dir().display());
            Ok(())
        }
    }
}

fn fetch_models(store: &ModelStore, base_url: &str) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );

    let fetched = store.fetch_missing(base_url, &mut |event| match event {
        FetchEvent::Started { model, total } => {
            pb.reset();
            pb.set_length(total.unwrap_or(0));
            pb.set_message(model.name);
        }
        FetchEvent::Progress { downloaded, .. } => pb.set_position(downloaded),
        FetchEvent::Finished { model } => pb.println(format!("fetched {}", model.filename)),
    })?;

    if fetched == 0 {
        pb.finish_and_clear();
        println!("All models already installed");
    } else {
        pb.finish_with_message(format!("{fetched} model(s) downloaded"));
    }
    Ok(())
}

fn list_models(store: &ModelStore) {
    let models = store.list();

    println!("Models directory: {}", store.dir().display());
    println!();

    for (info, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        println!(
            "  {status} {} ({}) - {}",
            info.name, info.filename, info.description
        );
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());
}
