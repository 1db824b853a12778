//! Audio chunking with overlap-add for model-based separation
//!
//! HTDemucs-style models accept a bounded segment length, so long tracks are
//! split into overlapping chunks and the separated stems are crossfaded back
//! together.

use super::traits::StemSet;
use crate::error::{Result, VocalprepError};
use crate::types::StereoBuffer;

/// Maximum segment length in seconds accepted by HTDemucs v4
pub const MAX_SEGMENT_SECONDS: f32 = 7.8;

/// Overlap between segments in seconds (for smooth crossfade)
pub const OVERLAP_SECONDS: f32 = 1.0;

/// Configuration for audio chunking
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum samples per chunk
    pub chunk_samples: usize,
    /// Overlap samples between chunks
    pub overlap_samples: usize,
    /// Sample rate
    pub sample_rate: u32,
}

impl ChunkConfig {
    /// Segment layout for HTDemucs at 44.1kHz
    pub fn htdemucs() -> Self {
        Self::new(MAX_SEGMENT_SECONDS, OVERLAP_SECONDS, 44100)
    }

    pub fn new(max_seconds: f32, overlap_seconds: f32, sample_rate: u32) -> Self {
        Self {
            chunk_samples: (max_seconds * sample_rate as f32) as usize,
            overlap_samples: (overlap_seconds * sample_rate as f32) as usize,
            sample_rate,
        }
    }

    /// Distance between chunk starts
    pub fn stride(&self) -> usize {
        self.chunk_samples.saturating_sub(self.overlap_samples)
    }
}

/// A single audio chunk ready for inference
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub index: usize,
    /// Start sample in the full track
    pub start_sample: usize,
    pub audio: StereoBuffer,
}

/// Separated stems for one chunk
#[derive(Debug, Clone)]
pub struct StemChunk {
    pub index: usize,
    /// Start sample in the full track
    pub start_sample: usize,
    pub stems: StemSet,
}

/// Split audio into overlapping chunks
pub fn chunk_audio(audio: &StereoBuffer, config: &ChunkConfig) -> Vec<AudioChunk> {
    let total_samples = audio.len();
    let stride = config.stride().max(1);

    if total_samples <= config.chunk_samples {
        return vec![AudioChunk {
            index: 0,
            start_sample: 0,
            audio: audio.clone(),
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total_samples {
        let end = (start + config.chunk_samples).min(total_samples);

        chunks.push(AudioChunk {
            index: chunks.len(),
            start_sample: start,
            audio: StereoBuffer::new(
                audio.left[start..end].to_vec(),
                audio.right[start..end].to_vec(),
                audio.sample_rate,
            ),
        });

        if end == total_samples {
            break;
        }
        start += stride;
    }

    chunks
}

/// Reassemble separated chunks using overlap-add with linear crossfades
pub fn overlap_add(
    chunks: &[StemChunk],
    config: &ChunkConfig,
    total_samples: usize,
) -> Result<StemSet> {
    let first = chunks
        .first()
        .ok_or_else(|| VocalprepError::engine_error("no separated chunks to reassemble"))?;
    let sample_rate = first.stems.vocals.sample_rate;

    let mut vocals = Accumulator::new(total_samples);
    let mut accompaniment = Accumulator::new(total_samples);
    let mut weight_sum = vec![0.0f32; total_samples];

    for chunk in chunks {
        let chunk_len = chunk.stems.vocals.len().min(chunk.stems.accompaniment.len());
        let weights = crossfade_weights(
            chunk_len,
            config.overlap_samples,
            chunk.index == 0,
            chunk.index == chunks.len() - 1,
        );

        vocals.add(&chunk.stems.vocals, chunk.start_sample, &weights);
        accompaniment.add(&chunk.stems.accompaniment, chunk.start_sample, &weights);

        for (i, w) in weights.iter().enumerate() {
            if let Some(sum) = weight_sum.get_mut(chunk.start_sample + i) {
                *sum += w;
            }
        }
    }

    Ok(StemSet {
        vocals: vocals.finish(&weight_sum, sample_rate),
        accompaniment: accompaniment.finish(&weight_sum, sample_rate),
    })
}

/// Weighted running sum of one stem
struct Accumulator {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Accumulator {
    fn new(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
        }
    }

    fn add(&mut self, stem: &StereoBuffer, offset: usize, weights: &[f32]) {
        let total = self.left.len();
        for (i, &w) in weights.iter().enumerate() {
            let out_idx = offset + i;
            if out_idx >= total {
                break;
            }
            self.left[out_idx] += stem.left[i] * w;
            self.right[out_idx] += stem.right[i] * w;
        }
    }

    fn finish(mut self, weight_sum: &[f32], sample_rate: u32) -> StereoBuffer {
        for ((l, r), &w) in self.left.iter_mut().zip(self.right.iter_mut()).zip(weight_sum) {
            if w > 1e-8 {
                *l /= w;
                *r /= w;
            }
        }
        StereoBuffer::new(self.left, self.right, sample_rate)
    }
}

/// Linear fade-in/fade-out weights for a chunk
fn crossfade_weights(chunk_len: usize, overlap: usize, is_first: bool, is_last: bool) -> Vec<f32> {
    let mut weights = vec![1.0f32; chunk_len];
    let fade_len = overlap.min(chunk_len);
    if fade_len == 0 {
        return weights;
    }

    if !is_first {
        for (i, weight) in weights.iter_mut().take(fade_len).enumerate() {
            *weight = i as f32 / fade_len as f32;
        }
    }

    if !is_last {
        let start = chunk_len - fade_len;
        for (i, weight) in weights[start..].iter_mut().enumerate() {
            *weight *= (fade_len - i) as f32 / fade_len as f32;
        }
    }

    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, sample_rate: u32) -> StereoBuffer {
        let left: Vec<f32> = (0..n).map(|i| i as f32 / n as f32).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        StereoBuffer::new(left, right, sample_rate)
    }

    #[test]
    fn test_chunk_config_htdemucs() {
        let config = ChunkConfig::htdemucs();
        assert_eq!(config.sample_rate, 44100);
        assert!(config.chunk_samples > 340000 && config.chunk_samples < 350000);
        assert_eq!(config.overlap_samples, 44100);
        assert_eq!(config.stride(), config.chunk_samples - config.overlap_samples);
    }

    #[test]
    fn test_chunk_short_audio() {
        let chunks = chunk_audio(&ramp(1000, 44100), &ChunkConfig::htdemucs());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].audio.len(), 1000);
    }

    #[test]
    fn test_chunks_cover_whole_track() {
        let config = ChunkConfig::new(1.0, 0.25, 100);
        let audio = ramp(430, 100);
        let chunks = chunk_audio(&audio, &config);

        assert_eq!(chunks[0].start_sample, 0);
        let last = chunks.last().unwrap();
        assert_eq!(last.start_sample + last.audio.len(), 430);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_sample - pair[0].start_sample, 75);
        }
    }

    #[test]
    fn test_identity_separation_reassembles_exactly() {
        let config = ChunkConfig::new(1.0, 0.25, 100);
        let audio = ramp(430, 100);
        let chunks = chunk_audio(&audio, &config);

        // Every chunk passes straight through as "vocals" and silence as accompaniment
        let stem_chunks: Vec<StemChunk> = chunks
            .iter()
            .map(|c| StemChunk {
                index: c.index,
                start_sample: c.start_sample,
                stems: StemSet {
                    vocals: c.audio.clone(),
                    accompaniment: StereoBuffer::new(
                        vec![0.0; c.audio.len()],
                        vec![0.0; c.audio.len()],
                        100,
                    ),
                },
            })
            .collect();

        let stems = overlap_add(&stem_chunks, &config, 430).unwrap();
        assert_eq!(stems.vocals.len(), 430);
        for i in 0..430 {
            assert!((stems.vocals.left[i] - audio.left[i]).abs() < 1e-5, "sample {}", i);
            assert!((stems.vocals.right[i] - audio.right[i]).abs() < 1e-5);
        }
        assert!(stems.accompaniment.left.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_overlap_add_requires_chunks() {
        assert!(overlap_add(&[], &ChunkConfig::htdemucs(), 10).is_err());
    }

    #[test]
    fn test_crossfade_weights() {
        let weights = crossfade_weights(100, 20, false, false);
        assert!(weights[0] < 0.1);
        assert!(weights[10] > 0.4 && weights[10] < 0.6);
        assert!(weights[50] > 0.9);
        assert!(weights[99] < 0.1);

        let first = crossfade_weights(100, 20, true, false);
        assert!(first[0] > 0.99);
        let last = crossfade_weights(100, 20, false, true);
        assert!(last[99] > 0.99);
    }
}
