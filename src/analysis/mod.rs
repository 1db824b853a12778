//! Vocal presence analysis
//!
//! [`FeatureExtractor`] turns audio into spectral descriptors and
//! [`VocalConfidenceScorer`] reduces them to a confidence and recommendation.
//! [`analyze_file`] runs both and converts any failure into an `error` report.

pub mod features;
pub mod scorer;
pub mod spectral;

pub use features::{FeatureConfig, FeatureExtractor};
pub use scorer::VocalConfidenceScorer;

use crate::error::Result;
use crate::types::{AnalysisReport, AudioSummary, ConfidenceAssessment};
use std::path::Path;
use tracing::{info, warn};

/// Extract features from a file and score them
pub fn try_analyze_file(
    extractor: &FeatureExtractor,
    path: &Path,
) -> Result<(ConfidenceAssessment, AudioSummary)> {
    let (features, summary) = extractor.extract_file(path)?;
    let assessment = VocalConfidenceScorer::new().score(&features);
    Ok((assessment, summary))
}

/// Analyze a file, reporting failures inside the returned report
pub fn analyze_file(extractor: &FeatureExtractor, path: &Path) -> AnalysisReport {
    match try_analyze_file(extractor, path) {
        Ok((assessment, summary)) => {
            info!(
                "{}: vocal confidence {:.3} ({})",
                path.display(),
                assessment.confidence,
                assessment.recommendation.as_str()
            );
            AnalysisReport::from_assessment(assessment, summary)
        }
        Err(e) => {
            warn!("Analysis failed for {}: {}", path.display(), e);
            AnalysisReport::failed(&e)
        }
    }
}
