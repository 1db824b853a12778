//! vocalprep - Vocal detection and stem separation for DJ setlist preparation
//!
//! Estimates whether a recording contains vocals and, when it does, separates
//! it into an instrumental and a vocal stem. Instrumental tracks are copied
//! through unmodified so every setlist entry ends up with a DJ-ready file.
//!
//! # Architecture
//!
//! - `audio`: Decoding with symphonia, WAV output with hound
//! - `analysis`: Spectral features and the vocal confidence scorer
//! - `separation`: Swappable separation engines and the per-track orchestrator
//! - `pipeline`: Per-track workflow, service facade and batch driver
//! - `discovery`: File scanning for batch runs
//! - `export`: JSON batch report
//! - `config`: CLI argument parsing and runtime settings
//!
//! # Example
//!
//! ```no_run
//! use vocalprep::{config::Settings, VocalSeparationService};
//! use std::path::Path;
//!
//! let service = VocalSeparationService::from_settings(&Settings::default())
//!     .expect("invalid settings");
//! let result = service.process(Path::new("set/01.mp3"), "Opening Track", Path::new("out"));
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! service.shutdown();
//! ```

pub mod analysis;
pub mod audio;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod separation;
pub mod types;

// Re-export key types at crate root
pub use error::{ErrorKind, Result, VocalprepError};
pub use pipeline::VocalSeparationService;
pub use types::{
    AnalysisReport, AudioAsset, AudioBuffer, FeatureVector, OutputFiles, Recommendation,
    SeparationResult, StereoBuffer, TrackProcessingResult,
};
