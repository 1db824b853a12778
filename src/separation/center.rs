//! Mid/side center-channel separation
//!
//! Lead vocals are usually mixed to the center of the stereo image. The mid
//! signal `(L + R) / 2` carries them, the side signal `(L - R) / 2` carries the
//! wide instrumentation. The two stems sum back to the input exactly.

use super::traits::{SeparationEngine, StemSet};
use crate::error::{Result, VocalprepError};
use crate::types::StereoBuffer;
use tracing::debug;

/// Separation engine that needs no model
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterCancelEngine;

impl CenterCancelEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SeparationEngine for CenterCancelEngine {
    fn separate(&mut self, audio: &StereoBuffer) -> Result<StemSet> {
        if audio.is_empty() {
            return Err(VocalprepError::engine_error("cannot separate empty audio"));
        }

        let n = audio.len();
        let mut mid = Vec::with_capacity(n);
        let mut side = Vec::with_capacity(n);
        for (&l, &r) in audio.left[..n].iter().zip(&audio.right[..n]) {
            mid.push((l + r) * 0.5);
            side.push((l - r) * 0.5);
        }
        let side_inverted: Vec<f32> = side.iter().map(|s| -s).collect();

        debug!("Center-cancel split {} samples", n);

        Ok(StemSet {
            vocals: StereoBuffer::new(mid.clone(), mid, audio.sample_rate),
            accompaniment: StereoBuffer::new(side, side_inverted, audio.sample_rate),
        })
    }

    fn sample_rate(&self) -> Option<u32> {
        None
    }

    fn name(&self) -> &'static str {
        "center-cancel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stems_sum_to_input() {
        let left = vec![0.5, -0.25, 0.1, 0.0];
        let right = vec![0.3, 0.25, -0.1, 0.7];
        let input = StereoBuffer::new(left.clone(), right.clone(), 44100);

        let stems = CenterCancelEngine::new().separate(&input).unwrap();

        for i in 0..4 {
            let l = stems.vocals.left[i] + stems.accompaniment.left[i];
            let r = stems.vocals.right[i] + stems.accompaniment.right[i];
            assert!((l - left[i]).abs() < 1e-6);
            assert!((r - right[i]).abs() < 1e-6);
        }
        assert_eq!(stems.vocals.sample_rate, 44100);
    }

    #[test]
    fn test_centered_source_goes_to_vocals() {
        let mono = vec![0.4, -0.2, 0.9];
        let input = StereoBuffer::new(mono.clone(), mono.clone(), 22050);

        let stems = CenterCancelEngine::new().separate(&input).unwrap();

        assert_eq!(stems.vocals.left, mono);
        assert!(stems.accompaniment.left.iter().all(|&s| s == 0.0));
        assert!(stems.accompaniment.right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_empty_input_is_engine_error() {
        let input = StereoBuffer::new(vec![], vec![], 44100);
        let err = CenterCancelEngine::new().separate(&input).unwrap_err();
        assert!(matches!(err, VocalprepError::EngineError { .. }));
    }

    #[test]
    fn test_accepts_any_rate() {
        assert_eq!(CenterCancelEngine::new().sample_rate(), None);
        assert_eq!(CenterCancelEngine::new().name(), "center-cancel");
    }
}
