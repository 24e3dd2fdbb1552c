use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use crate::dataset::Dataset;
use crate::model;
use crate::seed;

/// Startup options. Every flag has an environment fallback so the host
/// application can configure the sidecar without building an argv.
#[derive(Debug, Clone, Parser)]
#[command(name = "rosterd")]
#[command(about = "Student roster sidecar speaking line-delimited JSON over stdio")]
#[command(
    after_help = "Environment:\n  ROSTERD_WORKSPACE   Workspace directory (SQLite backend)\n  ROSTERD_SEED_DEMO   Load demo data at startup\n  ROSTERD_LOG         Log level written to stderr"
)]
pub struct Cli {
    /// Open this directory as a SQLite workspace instead of the in-memory store.
    #[arg(long, env = "ROSTERD_WORKSPACE")]
    pub workspace: Option<PathBuf>,
    /// Load the demo roster when the dataset starts out empty.
    #[arg(long, env = "ROSTERD_SEED_DEMO", default_value_t = false)]
    pub seed_demo: bool,
    #[arg(long, env = "ROSTERD_LOG", default_value = "warn")]
    pub log_level: LevelFilter,
}

impl Cli {
    /// Logs go to stderr; stdout carries the protocol.
    pub fn init_logging(&self) {
        env_logger::Builder::new()
            .filter_level(self.log_level)
            .target(env_logger::Target::Stderr)
            .init();
    }

    pub fn open_dataset(&self) -> anyhow::Result<Dataset> {
        let mut dataset = match &self.workspace {
            Some(path) => Dataset::open_workspace(path)
                .with_context(|| format!("opening workspace {}", path.display()))?,
            None => Dataset::in_memory(),
        };
        if self.seed_demo {
            match seed::load_demo(&mut dataset, model::today()) {
                Ok(_) => {
                    dataset.touch();
                }
                Err(e) => log::warn!("demo data not loaded: {}", e),
            }
        }
        log::info!(
            "dataset ready: backend={} revision={}",
            dataset.backend().label(),
            dataset.revision()
        );
        Ok(dataset)
    }
}
