//! Unified error types for vocalprep
//!
//! Error strategy:
//! - Per-track errors (decode, engine, output): recoverable, reported inside the
//!   track's result object so a batch can continue
//! - Invocation errors (validation): reported once, process exits non-zero
//!
//! Every variant maps onto an [`ErrorKind`] so callers can tell failure classes apart
//! without matching on messages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC";

/// Top-level error type for vocalprep operations
#[derive(Debug, Error)]
pub enum VocalprepError {
    // =========================================================================
    // Input errors - the track cannot be read
    // =========================================================================
    #[error("Failed to decode audio file '{path}': {reason} (supported formats: {SUPPORTED_FORMATS})")]
    DecodeError { path: PathBuf, reason: String },

    #[error("File not found: '{0}'")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Separation engine errors
    // =========================================================================
    #[error("Separation engine failed: {reason}")]
    EngineError { reason: String },

    #[error("Separation engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    // =========================================================================
    // Output errors
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}")]
    OutputError { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Invocation errors
    // =========================================================================
    #[error("Invalid arguments: {0}")]
    ValidationError(String),
}

/// Result type alias for vocalprep operations
pub type Result<T> = std::result::Result<T, VocalprepError>;

/// Failure class of a [`VocalprepError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unreadable, corrupt or empty audio
    Decode,
    /// Separation backend failure
    Engine,
    /// Filesystem failure
    Io,
    /// Malformed invocation arguments
    Validation,
}

impl ErrorKind {
    /// Per-track failures a batch records and moves past
    pub fn is_recoverable(self) -> bool {
        self != ErrorKind::Validation
    }
}

impl VocalprepError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VocalprepError::DecodeError { .. } | VocalprepError::FileNotFound(_) => {
                ErrorKind::Decode
            }
            VocalprepError::EngineError { .. } | VocalprepError::EngineUnavailable { .. } => {
                ErrorKind::Engine
            }
            VocalprepError::OutputError { .. } | VocalprepError::Io(_) => ErrorKind::Io,
            VocalprepError::ValidationError(_) => ErrorKind::Validation,
        }
    }

    /// Returns true if a batch should record this failure and move on to the next track
    pub fn is_recoverable(&self) -> bool {
        self.kind().is_recoverable()
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        VocalprepError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an engine failure
    pub fn engine_error(reason: impl Into<String>) -> Self {
        VocalprepError::EngineError {
            reason: reason.into(),
        }
    }

    /// Create an engine-unavailable error
    pub fn engine_unavailable(reason: impl Into<String>) -> Self {
        VocalprepError::EngineUnavailable {
            reason: reason.into(),
        }
    }

    /// Engine requested that was not compiled in
    pub fn engine_feature_disabled() -> Self {
        VocalprepError::EngineUnavailable {
            reason: "ONNX stem separation not compiled in (build with --features stems)"
                .to_string(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!(
                    "Directory does not exist: {}",
                    path.parent().map(|p| p.display().to_string()).unwrap_or_default()
                )
            }
            _ => err.to_string(),
        };
        VocalprepError::OutputError { path, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            VocalprepError::decode_error("a.wav", "bad header").kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            VocalprepError::FileNotFound(PathBuf::from("a.wav")).kind(),
            ErrorKind::Decode
        );
        assert_eq!(VocalprepError::engine_error("boom").kind(), ErrorKind::Engine);
        assert_eq!(
            VocalprepError::engine_feature_disabled().kind(),
            ErrorKind::Engine
        );
        assert_eq!(
            VocalprepError::Io(std::io::Error::other("disk full")).kind(),
            ErrorKind::Io
        );
        assert_eq!(
            VocalprepError::ValidationError("hop".into()).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_only_validation_is_fatal() {
        assert!(VocalprepError::engine_error("x").is_recoverable());
        assert!(VocalprepError::decode_error("a", "b").is_recoverable());
        assert!(!VocalprepError::ValidationError("x".into()).is_recoverable());
        assert!(ErrorKind::Io.is_recoverable());
        assert!(!ErrorKind::Validation.is_recoverable());
    }

    #[test]
    fn test_output_error_permission_message() {
        let err = VocalprepError::output_error(
            "/out/track_vocals.wav",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.to_string().contains("Permission denied"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Validation).unwrap();
        assert_eq!(json, "\"validation\"");
    }
}
