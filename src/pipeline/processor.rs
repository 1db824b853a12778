//! Per-track setlist workflow
//!
//! Analyze, then either separate (vocals detected) or copy the track through
//! unmodified (instrumental). Every outcome, including failures, is returned as
//! a [`TrackProcessingResult`].

use crate::analysis::{analyze_file, FeatureExtractor};
use crate::audio;
use crate::error::{Result, VocalprepError};
use crate::separation::orchestrator::copy_path;
use crate::separation::{EngineHandle, TrackSeparationOrchestrator};
use crate::types::TrackProcessingResult;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name used when a title has no filesystem-safe characters left
const FALLBACK_TITLE: &str = "track";

/// Drives one track through analysis and separation or passthrough
pub struct SetlistTrackProcessor<'a> {
    extractor: &'a FeatureExtractor,
    engine: &'a EngineHandle,
}

impl<'a> SetlistTrackProcessor<'a> {
    pub fn new(extractor: &'a FeatureExtractor, engine: &'a EngineHandle) -> Self {
        Self { extractor, engine }
    }

    /// Process one track into `<output_dir>/<sanitized title>/`
    pub fn process(&self, input: &Path, song_title: &str, output_dir: &Path) -> TrackProcessingResult {
        let analysis = analyze_file(self.extractor, input);
        if analysis.is_error() {
            return TrackProcessingResult::analysis_failed(song_title, analysis);
        }

        let safe_title = sanitize_title(song_title);
        let song_dir = output_dir.join(&safe_title);
        let prefix = file_prefix(&safe_title);

        if analysis.recommendation.should_separate() {
            info!(
                "'{}': {} - separating",
                song_title,
                analysis.recommendation.as_str()
            );
            let separation =
                TrackSeparationOrchestrator::new(self.engine).separate(input, &song_dir, &prefix);
            return TrackProcessingResult::separated(song_title, analysis, separation);
        }

        info!("'{}': instrumental - copying through", song_title);
        match passthrough(input, &song_dir, &prefix) {
            Ok(dj_ready) => TrackProcessingResult::passthrough(song_title, analysis, dj_ready),
            Err(e) => {
                warn!("Passthrough failed for {}: {}", input.display(), e);
                TrackProcessingResult::passthrough_failed(song_title, analysis, &e)
            }
        }
    }
}

/// Copy the source unmodified to `<prefix>_dj_ready.<ext>`
fn passthrough(input: &Path, song_dir: &Path, prefix: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(song_dir).map_err(|e| VocalprepError::output_error(song_dir, e))?;
    let dj_ready = copy_path(input, song_dir, prefix, "dj_ready");
    audio::copy_verbatim(input, &dj_ready)?;
    Ok(dj_ready)
}

/// Reduce a song title to a filesystem-safe name
///
/// Keeps alphanumerics, spaces, hyphens and underscores and trims trailing
/// whitespace. A title with nothing left becomes `track`.
pub fn sanitize_title(title: &str) -> String {
    let safe: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe = safe.trim_end();
    if safe.trim_start().is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        safe.to_string()
    }
}

/// Filename prefix for a sanitized title: spaces become underscores
pub fn file_prefix(safe_title: &str) -> String {
    safe_title.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_path_hostile_characters() {
        assert_eq!(sanitize_title("Track/1:*?"), "Track1");
        assert_eq!(sanitize_title("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_title("AC\\DC <Live>|\"Remix\""), "ACDC LiveRemix");
    }

    #[test]
    fn test_sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize_title("My Song - Extended_Mix"), "My Song - Extended_Mix");
        assert_eq!(sanitize_title("Beyoncé Déjà Vu"), "Beyoncé Déjà Vu");
    }

    #[test]
    fn test_sanitize_trims_trailing_whitespace_only() {
        assert_eq!(sanitize_title("  Intro  "), "  Intro");
        assert_eq!(sanitize_title("Song ?"), "Song");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_title(""), "track");
        assert_eq!(sanitize_title("/:*?"), "track");
        assert_eq!(sanitize_title("   "), "track");
    }

    #[test]
    fn test_file_prefix_replaces_spaces() {
        assert_eq!(file_prefix("My Song - Live"), "My_Song_-_Live");
    }
}
