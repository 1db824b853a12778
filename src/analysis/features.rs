//! Spectral feature extraction
//!
//! Computes per-frame spectral centroids and MFCCs from a mono signal at its
//! native sample rate. Frames are centred: the signal is padded with
//! `frame_size / 2` zeros on both sides, giving `1 + len / hop_length` frames.

use super::spectral::{dct_basis, hann_window, power_to_db, MelFilterBank};
use crate::audio;
use crate::error::{Result, VocalprepError};
use crate::types::{AudioBuffer, AudioSummary, FeatureVector};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Feature extraction parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureConfig {
    /// FFT frame size in samples
    pub frame_size: usize,
    /// Hop between frames in samples
    pub hop_length: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// Number of MFCCs kept per frame
    pub n_mfcc: usize,
    /// Dynamic range kept below the loudest mel band, in dB
    pub top_db: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_length: 512,
            n_mels: 40,
            n_mfcc: 13,
            top_db: 80.0,
        }
    }
}

impl FeatureConfig {
    /// Check that the parameters describe a usable analysis
    pub fn validate(&self) -> Result<()> {
        if self.frame_size < 2 {
            return Err(VocalprepError::ValidationError(format!(
                "frame size must be at least 2 samples, got {}",
                self.frame_size
            )));
        }
        if self.hop_length == 0 || self.hop_length > self.frame_size {
            return Err(VocalprepError::ValidationError(format!(
                "hop length must be between 1 and the frame size ({}), got {}",
                self.frame_size, self.hop_length
            )));
        }
        // Formant energy reads coefficients 1..=3
        if self.n_mfcc < 4 {
            return Err(VocalprepError::ValidationError(format!(
                "at least 4 MFCCs are required, got {}",
                self.n_mfcc
            )));
        }
        if self.n_mels < self.n_mfcc {
            return Err(VocalprepError::ValidationError(format!(
                "mel bands ({}) must not be fewer than MFCCs ({})",
                self.n_mels, self.n_mfcc
            )));
        }
        if !(self.top_db.is_finite() && self.top_db > 0.0) {
            return Err(VocalprepError::ValidationError(format!(
                "top_db must be positive, got {}",
                self.top_db
            )));
        }
        Ok(())
    }
}

/// Extracts [`FeatureVector`]s from audio
///
/// Holds the planned FFT, window and DCT basis for its configuration. It is
/// `Sync`, so one extractor can serve a whole parallel batch.
pub struct FeatureExtractor {
    config: FeatureConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    dct: Vec<Vec<f32>>,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.frame_size);

        Ok(Self {
            fft,
            window: hann_window(config.frame_size),
            dct: dct_basis(config.n_mfcc, config.n_mels),
            config,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Decode a file and extract its features
    pub fn extract_file(&self, path: &Path) -> Result<(FeatureVector, AudioSummary)> {
        let asset = audio::decode(path)?;
        let summary = asset.summary();
        let mono = asset.to_mono();
        drop(asset);

        let features = self.extract(&mono)?;
        Ok((features, summary))
    }

    /// Extract centroids and MFCCs from a mono buffer
    pub fn extract(&self, audio: &AudioBuffer) -> Result<FeatureVector> {
        if audio.sample_rate == 0 {
            return Err(VocalprepError::ValidationError(
                "cannot analyze audio with a sample rate of 0".to_string(),
            ));
        }

        let n_fft = self.config.frame_size;
        let hop = self.config.hop_length;
        let pad = n_fft / 2;
        let num_bins = n_fft / 2 + 1;
        let num_frames = 1 + audio.len() / hop;
        let bin_hz = audio.sample_rate as f32 / n_fft as f32;

        let mel_bank = MelFilterBank::new(self.config.n_mels, n_fft, audio.sample_rate);

        let mut spectral_centroids = Vec::with_capacity(num_frames);
        let mut mel_db: Vec<Vec<f32>> = Vec::with_capacity(num_frames);

        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut power = vec![0.0f32; num_bins];
        let mut mel = Vec::with_capacity(self.config.n_mels);

        for frame_idx in 0..num_frames {
            // Frame start in padded coordinates; samples before `pad` are zeros
            let start = frame_idx * hop;
            for (i, (slot, &w)) in buffer.iter_mut().zip(&self.window).enumerate() {
                let sample = (start + i)
                    .checked_sub(pad)
                    .and_then(|idx| audio.samples.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            let mut weighted = 0.0f32;
            let mut magnitude_sum = 0.0f32;
            for (k, (c, p)) in buffer[..num_bins].iter().zip(power.iter_mut()).enumerate() {
                let magnitude = c.norm();
                weighted += k as f32 * bin_hz * magnitude;
                magnitude_sum += magnitude;
                *p = c.norm_sqr();
            }
            spectral_centroids.push(if magnitude_sum > 0.0 {
                weighted / magnitude_sum
            } else {
                0.0
            });

            mel_bank.apply(&power, &mut mel);
            mel_db.push(mel.iter().map(|&e| power_to_db(e)).collect());
        }

        // Clip the dynamic range relative to the loudest band of the whole signal
        let peak = mel_db
            .iter()
            .flatten()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - self.config.top_db;

        let mfcc = mel_db
            .iter()
            .map(|frame| {
                self.dct
                    .iter()
                    .map(|basis| {
                        basis
                            .iter()
                            .zip(frame)
                            .map(|(b, &db)| b * db.max(floor))
                            .sum::<f32>()
                    })
                    .collect()
            })
            .collect();

        debug!(
            "Extracted {} frames ({} MFCCs) at {}Hz",
            num_frames, self.config.n_mfcc, audio.sample_rate
        );

        Ok(FeatureVector {
            spectral_centroids,
            mfcc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> AudioBuffer {
        let n = (sample_rate as f32 * seconds) as usize;
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        AudioBuffer::new(samples, sample_rate)
    }

    #[test]
    fn test_frame_count_is_centred() {
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        let audio = AudioBuffer::new(vec![0.0; 22050], 22050);
        let features = extractor.extract(&audio).unwrap();
        assert_eq!(features.num_frames(), 1 + 22050 / 512);
        assert_eq!(features.mfcc.len(), features.num_frames());
        assert!(features.mfcc.iter().all(|f| f.len() == 13));
    }

    #[test]
    fn test_centroid_tracks_pure_tone() {
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        let features = extractor.extract(&sine(3000.0, 22050, 1.0)).unwrap();
        // Skip edge frames that include padding
        let middle = &features.spectral_centroids[8..features.num_frames() - 8];
        for &c in middle {
            assert!((c - 3000.0).abs() < 150.0, "centroid {}", c);
        }
        assert!(features.high_freq_energy() > 0.9);
    }

    #[test]
    fn test_low_tone_has_no_high_freq_energy() {
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        let features = extractor.extract(&sine(220.0, 22050, 1.0)).unwrap();
        assert_eq!(features.high_freq_energy(), 0.0);
    }

    #[test]
    fn test_silence_is_finite_and_flat() {
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        let features = extractor
            .extract(&AudioBuffer::new(vec![0.0; 8000], 8000))
            .unwrap();
        assert!(features.spectral_centroids.iter().all(|&c| c == 0.0));
        for frame in &features.mfcc {
            assert!(frame.iter().all(|c| c.is_finite()));
            for &c in &frame[1..] {
                assert!(c.abs() < 1e-3);
            }
        }
        assert_eq!(features.high_freq_energy(), 0.0);
        assert!(features.vocal_formant_energy().abs() < 1e-3);
    }

    #[test]
    fn test_short_input_still_yields_a_frame() {
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        let features = extractor
            .extract(&AudioBuffer::new(vec![0.1; 100], 44100))
            .unwrap();
        assert_eq!(features.num_frames(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_hop() {
        let config = FeatureConfig {
            hop_length: 4096,
            ..FeatureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VocalprepError::ValidationError(_))
        ));
        let config = FeatureConfig {
            hop_length: 0,
            ..FeatureConfig::default()
        };
        assert!(FeatureExtractor::new(config).is_err());
    }

    #[test]
    fn test_validate_rejects_too_few_mfcc() {
        let config = FeatureConfig {
            n_mfcc: 3,
            ..FeatureConfig::default()
        };
        assert!(config.validate().is_err());
        let config = FeatureConfig {
            n_mels: 10,
            n_mfcc: 13,
            ..FeatureConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        assert!(extractor.extract(&AudioBuffer::new(vec![0.0; 10], 0)).is_err());
    }
}
