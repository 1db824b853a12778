//! JSON batch report

use crate::error::{Result, VocalprepError};
use crate::types::TrackProcessingResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// JSON report schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level batch report
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchReport {
    /// Schema version for forward compatibility
    pub version: String,
    pub metadata: ReportMetadata,
    pub summary: BatchSummary,
    /// One process result per track, in discovery order
    pub tracks: Vec<TrackProcessingResult>,
}

/// Report metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// vocalprep version that generated this file
    pub generator_version: String,
    /// Timestamp of export (RFC 3339)
    pub exported_at: String,
    /// Number of tracks
    pub track_count: usize,
}

/// Per-outcome track counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_files: usize,
    /// Tracks split into stems
    pub separated: usize,
    /// Tracks copied through as instrumentals
    pub passthrough: usize,
    /// Tracks that ended without DJ-ready output
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_tracks(tracks: &[TrackProcessingResult]) -> Self {
        let mut summary = Self {
            total_files: tracks.len(),
            ..Self::default()
        };
        for track in tracks {
            match (track.success, track.separation_performed) {
                (false, _) => summary.failed += 1,
                (true, true) => summary.separated += 1,
                (true, false) => summary.passthrough += 1,
            }
        }
        summary
    }
}

impl BatchReport {
    pub fn new(summary: BatchSummary, tracks: Vec<TrackProcessingResult>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            metadata: ReportMetadata {
                generator_version: env!("CARGO_PKG_VERSION").to_string(),
                exported_at: chrono::Utc::now().to_rfc3339(),
                track_count: tracks.len(),
            },
            summary,
            tracks,
        }
    }
}

/// Write a batch report
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
/// This prevents data corruption if the write is interrupted.
pub fn write_report(report: &BatchReport, output_path: &Path) -> Result<()> {
    // Temp file in the same directory keeps the rename on one filesystem
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| VocalprepError::output_error(output_path, e))?;

    if let Err(e) = write_pretty(file, report) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(VocalprepError::OutputError {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        });
    }

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        VocalprepError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    info!(
        "Wrote report for {} tracks to {}",
        report.metadata.track_count,
        output_path.display()
    );

    Ok(())
}

/// Serialize and flush, so a failed final write is reported before the rename
fn write_pretty<W: Write>(out: W, report: &BatchReport) -> std::io::Result<()> {
    let mut writer = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()
}

/// Read a previously written batch report
pub fn read_report(path: &Path) -> Result<BatchReport> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VocalprepError::FileNotFound(path.to_path_buf())
        } else {
            VocalprepError::Io(e)
        }
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        VocalprepError::ValidationError(format!("invalid report {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VocalprepError;
    use crate::types::{AnalysisReport, ConfidenceAssessment, Recommendation, AudioSummary};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn analysis(recommendation: Recommendation) -> AnalysisReport {
        AnalysisReport::from_assessment(
            ConfidenceAssessment {
                confidence: 0.5,
                recommendation,
                message: recommendation.message().to_string(),
            },
            AudioSummary {
                duration: 1.0,
                sample_rate: 44100,
                channels: 2,
            },
        )
    }

    fn sample_tracks() -> Vec<TrackProcessingResult> {
        let missing = VocalprepError::FileNotFound(PathBuf::from("gone.wav"));
        vec![
            TrackProcessingResult::passthrough(
                "Intro",
                analysis(Recommendation::Instrumental),
                PathBuf::from("/out/Intro/Intro_dj_ready.wav"),
            ),
            TrackProcessingResult::separated(
                "Vocal",
                analysis(Recommendation::HighConfidenceVocals),
                crate::types::SeparationResult::failed(&VocalprepError::engine_error("boom")),
            ),
            TrackProcessingResult::analysis_failed("Gone", AnalysisReport::failed(&missing)),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let summary = BatchSummary::from_tracks(&sample_tracks());
        assert_eq!(
            summary,
            BatchSummary {
                total_files: 3,
                separated: 0,
                passthrough: 1,
                failed: 2,
            }
        );
    }

    #[test]
    fn test_write_and_read_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vocalprep.json");
        let tracks = sample_tracks();
        let report = BatchReport::new(BatchSummary::from_tracks(&tracks), tracks);

        write_report(&report, &path).unwrap();
        assert!(!dir.path().join("vocalprep.json.tmp").exists());

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["metadata"]["track_count"], 3);
        assert!(value["metadata"]["exported_at"].is_string());
        assert_eq!(value["tracks"][0]["output_files"]["dj_ready"], "/out/Intro/Intro_dj_ready.wav");
        assert_eq!(value["tracks"][2]["analysis"]["recommendation"], "error");

        let back = read_report(&path).unwrap();
        assert_eq!(back.tracks.len(), 3);
        assert_eq!(back.summary.failed, 2);
    }

    /// Accepts nothing, like a full disk
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_buffered_write_failure_is_reported() {
        // Small enough to sit entirely in the BufWriter until the flush
        let report = BatchReport::new(BatchSummary::default(), Vec::new());
        let err = write_pretty(FullDisk, &report).unwrap_err();
        assert!(err.to_string().contains("no space left"));
    }

    #[test]
    fn test_read_missing_report() {
        assert!(matches!(
            read_report(Path::new("/nonexistent/vocalprep.json")),
            Err(VocalprepError::FileNotFound(_))
        ));
    }
}
