//! Spectral building blocks for feature extraction
//!
//! Window, mel filterbank, decibel conversion and the DCT used by the MFCC
//! pipeline. All of these are computed once per [`FeatureConfig`](super::features::FeatureConfig)
//! and reused across frames.

use std::f32::consts::PI;

/// Floor applied to energies before taking the logarithm
pub const POWER_FLOOR: f32 = 1e-10;

/// Periodic Hann window of the given size
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Convert Hz to mel (HTK formula)
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mel to Hz (HTK formula)
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the positive-frequency bins of an FFT
///
/// Filters span 0 Hz to Nyquist and are area-normalised (each triangle is
/// scaled by `2 / bandwidth`).
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    /// One filter per mel band: (first non-zero bin, weights from that bin on)
    filters: Vec<(usize, Vec<f32>)>,
    num_bins: usize,
}

impl MelFilterBank {
    pub fn new(n_mels: usize, n_fft: usize, sample_rate: u32) -> Self {
        let num_bins = n_fft / 2 + 1;
        let nyquist = sample_rate as f32 / 2.0;
        let mel_max = hz_to_mel(nyquist);

        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();

        let bin_hz = sample_rate as f32 / n_fft as f32;

        let filters = edges
            .windows(3)
            .map(|w| {
                let (lo, center, hi) = (w[0], w[1], w[2]);
                let norm = if hi > lo { 2.0 / (hi - lo) } else { 0.0 };

                let weights: Vec<f32> = (0..num_bins)
                    .map(|k| {
                        let f = k as f32 * bin_hz;
                        let rising = if center > lo { (f - lo) / (center - lo) } else { 0.0 };
                        let falling = if hi > center { (hi - f) / (hi - center) } else { 0.0 };
                        rising.min(falling).max(0.0) * norm
                    })
                    .collect();

                // Store only the support of the triangle
                let start = weights.iter().position(|&w| w > 0.0).unwrap_or(num_bins);
                let end = weights.iter().rposition(|&w| w > 0.0).map_or(start, |e| e + 1);
                (start, weights[start..end].to_vec())
            })
            .collect();

        Self { filters, num_bins }
    }

    /// Number of mel bands
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply the filterbank to one frame's power spectrum
    pub fn apply(&self, power: &[f32], out: &mut Vec<f32>) {
        debug_assert_eq!(power.len(), self.num_bins);
        out.clear();
        out.extend(self.filters.iter().map(|(start, weights)| {
            weights
                .iter()
                .zip(&power[*start..])
                .map(|(w, p)| w * p)
                .sum::<f32>()
        }));
    }
}

/// Power to decibels with a floor, `10 * log10(max(x, 1e-10))`
pub fn power_to_db(power: f32) -> f32 {
    10.0 * power.max(POWER_FLOOR).log10()
}

/// Orthonormal DCT-II basis: `basis[k][n]` for the first `n_coeffs` coefficients
pub fn dct_basis(n_coeffs: usize, n_inputs: usize) -> Vec<Vec<f32>> {
    let n = n_inputs as f32;
    (0..n_coeffs)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_inputs)
                .map(|i| scale * (PI * k as f32 * (i as f32 + 0.5) / n).cos())
                .collect()
        })
        .collect()
}
