//! Service facade over analysis, separation and per-track processing
//!
//! Owns the feature extractor and the shared engine for the life of the
//! process. The three operations never fail: errors come back inside the
//! returned result objects.

use super::processor::{file_prefix, sanitize_title, SetlistTrackProcessor};
use crate::analysis::{analyze_file, FeatureConfig, FeatureExtractor};
use crate::config::Settings;
use crate::error::Result;
use crate::separation::{EngineHandle, TrackSeparationOrchestrator};
use crate::types::{AnalysisReport, SeparationResult, TrackProcessingResult};
use std::path::Path;

/// Entry point for `analyze`, `separate` and `process`
pub struct VocalSeparationService {
    extractor: FeatureExtractor,
    engine: EngineHandle,
}

impl VocalSeparationService {
    /// Fails only if the feature configuration is invalid
    pub fn new(features: FeatureConfig, engine: EngineHandle) -> Result<Self> {
        Ok(Self {
            extractor: FeatureExtractor::new(features)?,
            engine,
        })
    }

    /// Build from runtime settings; the engine is constructed on first use
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.features,
            EngineHandle::from_settings(settings.engine, settings.model_path.clone()),
        )
    }

    /// Estimate vocal confidence for one file
    pub fn analyze(&self, audio_file: &Path) -> AnalysisReport {
        analyze_file(&self.extractor, audio_file)
    }

    /// Separate one file into `<prefix>_instrumental`, `<prefix>_vocals` and `<prefix>_original`
    ///
    /// The prefix is sanitized like a song title, so outputs always land
    /// directly inside `output_dir`.
    pub fn separate(&self, audio_file: &Path, output_dir: &Path, prefix: &str) -> SeparationResult {
        let prefix = file_prefix(&sanitize_title(prefix));
        TrackSeparationOrchestrator::new(&self.engine).separate(audio_file, output_dir, &prefix)
    }

    /// Analyze one setlist track and separate or pass it through
    pub fn process(&self, audio_file: &Path, song_title: &str, output_dir: &Path) -> TrackProcessingResult {
        SetlistTrackProcessor::new(&self.extractor, &self.engine).process(audio_file, song_title, output_dir)
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Release the separation engine
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}
