//! Stem separation
//!
//! Swappable engines behind [`SeparationEngine`], a lazily built shared
//! [`EngineHandle`], and the [`TrackSeparationOrchestrator`] that turns an
//! engine run into files on disk.

pub mod center;
pub mod chunking;
pub mod engine;
pub mod model;
#[cfg(feature = "stems")]
pub mod onnx;
pub mod orchestrator;
pub mod traits;

pub use center::CenterCancelEngine;
pub use engine::{build_engine, EngineHandle, EngineKind};
#[cfg(feature = "stems")]
pub use onnx::OrtSeparationEngine;
pub use orchestrator::TrackSeparationOrchestrator;
pub use traits::{SeparationEngine, StemSet};
