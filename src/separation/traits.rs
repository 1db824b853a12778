//! Separation engine abstraction
//!
//! The orchestrator only sees this trait, so backends can be swapped without
//! touching the per-track workflow.

use crate::error::Result;
use crate::types::StereoBuffer;

/// Separated vocal and accompaniment signals, both at the input's sample rate
#[derive(Debug, Clone)]
pub struct StemSet {
    pub vocals: StereoBuffer,
    pub accompaniment: StereoBuffer,
}

/// Stem separation backend
///
/// Engines are not required to be reentrant; callers share one instance
/// through [`EngineHandle`](super::EngineHandle), which serializes access.
pub trait SeparationEngine: Send {
    /// Split a stereo waveform into vocals and accompaniment
    fn separate(&mut self, audio: &StereoBuffer) -> Result<StemSet>;

    /// Sample rate the engine expects its input at, or `None` for any rate
    fn sample_rate(&self) -> Option<u32>;

    /// Get the name of this engine (for logging)
    fn name(&self) -> &'static str;
}
