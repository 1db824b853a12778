//! Core data types for vocalprep
//!
//! These types represent the domain model and flow through the pipeline:
//! audio buffers in, feature vectors and assessments in the middle,
//! JSON-serializable result objects out.

use crate::error::{ErrorKind, VocalprepError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// Audio buffer types
// =============================================================================

/// A decoded audio file at its native sample rate and channel layout
///
/// Owned by the operation currently processing it and dropped once results
/// are produced.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    /// Source file path
    pub path: PathBuf,
    /// Interleaved samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source
    pub channels: u16,
}

impl AudioAsset {
    pub fn new(path: PathBuf, samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            path,
            samples,
            sample_rate,
            channels,
        }
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        // Guard against division by zero - use 0 duration for invalid sample rate
        if self.sample_rate > 0 {
            self.frames() as f64 / self.sample_rate as f64
        } else {
            0.0
        }
    }

    /// Check if the asset holds no audio
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Downmix to a mono analysis buffer by averaging channels
    pub fn to_mono(&self) -> AudioBuffer {
        let channels = self.channels.max(1) as usize;
        let mono = if channels == 1 {
            self.samples.clone()
        } else {
            self.samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };
        AudioBuffer::new(mono, self.sample_rate)
    }

    /// Reporting metadata for this asset
    pub fn summary(&self) -> AudioSummary {
        AudioSummary {
            duration: self.duration(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// Mono samples ready for analysis
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Stereo audio buffer handed to the separation engine
#[derive(Debug, Clone)]
pub struct StereoBuffer {
    /// Left channel samples normalized to [-1.0, 1.0]
    pub left: Vec<f32>,
    /// Right channel samples normalized to [-1.0, 1.0]
    pub right: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl StereoBuffer {
    pub fn new(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Self {
        let num_samples = left.len().min(right.len());
        let duration = if sample_rate > 0 {
            num_samples as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            left,
            right,
            sample_rate,
            duration,
        }
    }

    /// Number of samples per channel
    pub fn len(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create from interleaved [L, R, L, R, ...] samples
    pub fn from_interleaved(samples: &[f32], sample_rate: u32) -> Self {
        let num_frames = samples.len() / 2;
        let mut left = Vec::with_capacity(num_frames);
        let mut right = Vec::with_capacity(num_frames);

        for chunk in samples.chunks_exact(2) {
            left.push(chunk[0]);
            right.push(chunk[1]);
        }

        Self::new(left, right, sample_rate)
    }
}

/// Duration and channel metadata reported alongside an analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSummary {
    /// Duration in seconds
    pub duration: f64,
    /// Native sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source (before mono downmix)
    pub channels: u16,
}

// =============================================================================
// Analysis types
// =============================================================================

/// Spectral descriptors of a mono signal
#[derive(Debug, Clone, Default)]
pub struct FeatureVector {
    /// Spectral centroid per analysis frame, in Hz
    pub spectral_centroids: Vec<f32>,
    /// MFCCs per analysis frame: `mfcc[frame][coefficient]`
    pub mfcc: Vec<Vec<f32>>,
}

impl FeatureVector {
    /// Centroid above which a frame counts as vocal-range energy
    pub const HIGH_FREQ_THRESHOLD_HZ: f32 = 2000.0;

    /// Number of analysis frames
    pub fn num_frames(&self) -> usize {
        self.spectral_centroids.len()
    }

    /// Fraction of frames whose spectral centroid exceeds 2000 Hz
    pub fn high_freq_energy(&self) -> f64 {
        if self.spectral_centroids.is_empty() {
            return 0.0;
        }
        let above = self
            .spectral_centroids
            .iter()
            .filter(|&&c| c > Self::HIGH_FREQ_THRESHOLD_HZ)
            .count();
        above as f64 / self.spectral_centroids.len() as f64
    }

    /// Mean of MFCC coefficients 1..=3 across all frames
    pub fn vocal_formant_energy(&self) -> f64 {
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for frame in &self.mfcc {
            for &c in frame.iter().skip(1).take(3) {
                sum += c as f64;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

/// Vocal presence verdict derived from the confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Instrumental,
    ModerateVocals,
    HighConfidenceVocals,
    Error,
}

impl Recommendation {
    /// Whether this verdict calls for stem separation
    pub fn should_separate(self) -> bool {
        matches!(
            self,
            Recommendation::HighConfidenceVocals | Recommendation::ModerateVocals
        )
    }

    /// Human-readable explanation of the verdict
    pub fn message(self) -> &'static str {
        match self {
            Recommendation::HighConfidenceVocals => {
                "High confidence vocals detected - recommend vocal separation"
            }
            Recommendation::ModerateVocals => {
                "Moderate vocal content detected - separation may be beneficial"
            }
            Recommendation::Instrumental => {
                "Appears to be instrumental - separation may not be necessary"
            }
            Recommendation::Error => "Analysis failed",
        }
    }

    /// Wire name, e.g. `high_confidence_vocals`
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Instrumental => "instrumental",
            Recommendation::ModerateVocals => "moderate_vocals",
            Recommendation::HighConfidenceVocals => "high_confidence_vocals",
            Recommendation::Error => "error",
        }
    }
}

/// Output of the confidence scorer
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceAssessment {
    /// Vocal confidence in [0, 1]
    pub confidence: f64,
    pub recommendation: Recommendation,
    pub message: String,
}

/// JSON result of analyzing one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub vocal_confidence: f64,
    pub recommendation: Recommendation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl AnalysisReport {
    /// Successful analysis
    pub fn from_assessment(assessment: ConfidenceAssessment, summary: AudioSummary) -> Self {
        Self {
            vocal_confidence: assessment.confidence,
            recommendation: assessment.recommendation,
            message: Some(assessment.message),
            duration: Some(summary.duration),
            sample_rate: Some(summary.sample_rate),
            channels: Some(summary.channels),
            error: None,
            error_kind: None,
        }
    }

    /// Failed analysis: zero confidence, `error` recommendation
    pub fn failed(err: &VocalprepError) -> Self {
        Self {
            vocal_confidence: 0.0,
            recommendation: Recommendation::Error,
            message: None,
            duration: None,
            sample_rate: None,
            channels: None,
            error: Some(format!("Analysis failed: {}", err)),
            error_kind: Some(err.kind()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.recommendation == Recommendation::Error
    }
}

// =============================================================================
// Output types
// =============================================================================

/// Files produced for a track
///
/// A track is either separated into stems or passed through untouched; the two
/// key sets never mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputFiles {
    Separated {
        instrumental: PathBuf,
        vocals: PathBuf,
        original: PathBuf,
    },
    Passthrough {
        dj_ready: PathBuf,
    },
}

impl OutputFiles {
    /// All output paths
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            OutputFiles::Separated {
                instrumental,
                vocals,
                original,
            } => vec![instrumental.as_path(), vocals.as_path(), original.as_path()],
            OutputFiles::Passthrough { dj_ready } => vec![dj_ready.as_path()],
        }
    }

    /// The track a DJ should load: the instrumental stem or the passthrough copy
    pub fn dj_track(&self) -> &Path {
        match self {
            OutputFiles::Separated { instrumental, .. } => instrumental,
            OutputFiles::Passthrough { dj_ready } => dj_ready,
        }
    }
}

/// JSON result of separating one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_files: Option<OutputFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl SeparationResult {
    pub fn completed(output_files: OutputFiles) -> Self {
        Self {
            success: true,
            output_files: Some(output_files),
            message: Some("Vocal separation completed successfully".to_string()),
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(err: &VocalprepError) -> Self {
        Self {
            success: false,
            output_files: None,
            message: None,
            error: Some(format!("Separation failed: {}", err)),
            error_kind: Some(err.kind()),
        }
    }
}

/// JSON result of processing one setlist track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackProcessingResult {
    pub song_title: String,
    pub analysis: AnalysisReport,
    /// Whether the analysis called for separation (set even if separation then failed)
    pub separation_performed: bool,
    /// Whether the track ended with DJ-ready output files
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_files: Option<OutputFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl TrackProcessingResult {
    /// Analysis failed; nothing else was attempted
    pub fn analysis_failed(song_title: impl Into<String>, analysis: AnalysisReport) -> Self {
        let error = analysis.error.clone();
        let error_kind = analysis.error_kind;
        Self {
            song_title: song_title.into(),
            analysis,
            separation_performed: false,
            success: false,
            output_files: None,
            message: None,
            error,
            error_kind,
        }
    }

    /// Separation was attempted; its outcome is merged in whether it succeeded or not
    pub fn separated(
        song_title: impl Into<String>,
        analysis: AnalysisReport,
        separation: SeparationResult,
    ) -> Self {
        Self {
            song_title: song_title.into(),
            analysis,
            separation_performed: true,
            success: separation.success,
            output_files: separation.output_files,
            message: separation.message,
            error: separation.error,
            error_kind: separation.error_kind,
        }
    }

    /// Instrumental track copied through unmodified
    pub fn passthrough(
        song_title: impl Into<String>,
        analysis: AnalysisReport,
        dj_ready: PathBuf,
    ) -> Self {
        Self {
            song_title: song_title.into(),
            analysis,
            separation_performed: false,
            success: true,
            output_files: Some(OutputFiles::Passthrough { dj_ready }),
            message: Some(
                "No vocal separation needed - original track copied for DJ use".to_string(),
            ),
            error: None,
            error_kind: None,
        }
    }

    /// Passthrough copy failed
    pub fn passthrough_failed(
        song_title: impl Into<String>,
        analysis: AnalysisReport,
        err: &VocalprepError,
    ) -> Self {
        Self {
            song_title: song_title.into(),
            analysis,
            separation_performed: false,
            success: false,
            output_files: None,
            message: None,
            error: Some(format!("Processing failed: {}", err)),
            error_kind: Some(err.kind()),
        }
    }
}

// =============================================================================
// Supported formats
// =============================================================================

/// Audio formats vocalprep can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" | "wave" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            _ => None,
        }
    }

    /// Check if a path has a supported extension
    pub fn is_supported_path(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .is_some()
    }
}
