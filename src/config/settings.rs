//! Runtime configuration settings

use crate::analysis::FeatureConfig;
use crate::separation::EngineKind;
use std::path::PathBuf;

/// Runtime settings shared by every command
#[derive(Debug, Clone)]
pub struct Settings {
    /// Separation backend
    pub engine: EngineKind,
    /// Explicit separation model path
    pub model_path: Option<PathBuf>,
    /// Feature extraction parameters
    pub features: FeatureConfig,
    /// Number of batch worker threads
    pub threads: usize,
    /// Scan batch inputs recursively
    pub recursive: bool,
    /// Show progress bars
    pub show_progress: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        let (threads, recursive) = match &cli.command {
            super::cli::Command::Batch {
                threads, recursive, ..
            } => (threads.unwrap_or_else(default_threads), *recursive),
            _ => (default_threads(), true),
        };

        Self {
            engine: cli.engine,
            model_path: cli.model.clone(),
            features: FeatureConfig {
                frame_size: cli.frame_size,
                hop_length: cli.hop_length,
                ..FeatureConfig::default()
            },
            threads: threads.max(1),
            recursive,
            show_progress: !cli.quiet,
        }
    }
}

/// Leave one core for the separation engine
fn default_threads() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineKind::Auto,
            model_path: None,
            features: FeatureConfig::default(),
            threads: default_threads(),
            recursive: true,
            show_progress: true,
        }
    }
}
