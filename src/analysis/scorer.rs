//! Vocal confidence scoring
//!
//! Combines the fraction of bright frames with the mean low-order MFCC energy:
//!
//! ```text
//! confidence = clamp(0.6 * high_freq_energy + 0.4 * |formant_energy|, 0, 1)
//! ```

use crate::types::{ConfidenceAssessment, FeatureVector, Recommendation};

/// Weight of the high-frequency frame fraction
pub const HIGH_FREQ_WEIGHT: f64 = 0.6;

/// Weight of the formant energy magnitude
pub const FORMANT_WEIGHT: f64 = 0.4;

/// Confidence above which vocals are reported with high confidence
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Confidence above which moderate vocals are reported
pub const MODERATE_THRESHOLD: f64 = 0.4;

/// Maps feature vectors to a confidence and recommendation
#[derive(Debug, Clone, Copy, Default)]
pub struct VocalConfidenceScorer;

impl VocalConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Combine the two vocal indicators into a confidence in [0, 1]
    ///
    /// NaN inputs yield 0.
    pub fn combine(high_freq_energy: f64, formant_energy: f64) -> f64 {
        let raw = HIGH_FREQ_WEIGHT * high_freq_energy + FORMANT_WEIGHT * formant_energy.abs();
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }

    /// Recommendation for a confidence value; both thresholds are strict
    pub fn classify(confidence: f64) -> Recommendation {
        if confidence > HIGH_CONFIDENCE_THRESHOLD {
            Recommendation::HighConfidenceVocals
        } else if confidence > MODERATE_THRESHOLD {
            Recommendation::ModerateVocals
        } else {
            Recommendation::Instrumental
        }
    }

    /// Score a feature vector
    pub fn score(&self, features: &FeatureVector) -> ConfidenceAssessment {
        let high_freq = features.high_freq_energy();
        let formant = features.vocal_formant_energy();
        let confidence = Self::combine(high_freq, formant);
        let recommendation = Self::classify(confidence);

        tracing::debug!(
            high_freq_energy = high_freq,
            formant_energy = formant,
            confidence,
            recommendation = recommendation.as_str(),
            "Scored vocal confidence"
        );

        ConfidenceAssessment {
            confidence,
            recommendation,
            message: recommendation.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_weights() {
        assert!((VocalConfidenceScorer::combine(0.5, 0.25) - 0.4).abs() < 1e-12);
        // Sign of the formant energy is ignored
        assert_eq!(
            VocalConfidenceScorer::combine(0.3, -0.5),
            VocalConfidenceScorer::combine(0.3, 0.5)
        );
    }

    #[test]
    fn test_combine_clamps() {
        assert_eq!(VocalConfidenceScorer::combine(1.0, 40.0), 1.0);
        assert_eq!(VocalConfidenceScorer::combine(0.0, 0.0), 0.0);
        assert_eq!(VocalConfidenceScorer::combine(f64::NAN, 0.1), 0.0);
        assert_eq!(VocalConfidenceScorer::combine(0.1, f64::INFINITY), 1.0);
    }

    #[test]
    fn test_combine_stays_in_unit_interval() {
        let values = [-5.0, -1.0, -0.3, 0.0, 0.2, 0.5, 0.9, 1.0, 3.0, 250.0];
        for &h in &[0.0, 0.1, 0.5, 0.75, 1.0] {
            for &f in &values {
                let c = VocalConfidenceScorer::combine(h, f);
                assert!((0.0..=1.0).contains(&c), "h={} f={} -> {}", h, f, c);
            }
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(
            VocalConfidenceScorer::classify(0.7),
            Recommendation::ModerateVocals
        );
        assert_eq!(
            VocalConfidenceScorer::classify(0.7000001),
            Recommendation::HighConfidenceVocals
        );
        assert_eq!(
            VocalConfidenceScorer::classify(0.4),
            Recommendation::Instrumental
        );
        assert_eq!(
            VocalConfidenceScorer::classify(0.41),
            Recommendation::ModerateVocals
        );
        assert_eq!(
            VocalConfidenceScorer::classify(0.0),
            Recommendation::Instrumental
        );
    }

    #[test]
    fn test_classification_is_monotonic() {
        let rank = |r: Recommendation| match r {
            Recommendation::Instrumental => 0,
            Recommendation::ModerateVocals => 1,
            Recommendation::HighConfidenceVocals => 2,
            Recommendation::Error => unreachable!(),
        };
        let mut previous = 0;
        for i in 0..=1000 {
            let current = rank(VocalConfidenceScorer::classify(i as f64 / 1000.0));
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_score_bright_features() {
        let features = FeatureVector {
            spectral_centroids: vec![3000.0; 10],
            mfcc: vec![vec![0.0, 1.0, 1.0, 1.0]; 10],
        };
        let assessment = VocalConfidenceScorer::new().score(&features);
        assert_eq!(assessment.confidence, 1.0);
        assert_eq!(
            assessment.recommendation,
            Recommendation::HighConfidenceVocals
        );
        assert!(assessment.message.contains("recommend vocal separation"));
    }

    #[test]
    fn test_score_empty_features_is_instrumental() {
        let assessment = VocalConfidenceScorer::new().score(&FeatureVector::default());
        assert_eq!(assessment.confidence, 0.0);
        assert_eq!(assessment.recommendation, Recommendation::Instrumental);
    }
}
