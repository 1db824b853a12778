//! File discovery and scanning

use crate::error::{Result, VocalprepError};
use crate::types::AudioFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Discovered audio file with basic metadata
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub format: AudioFormat,
    pub size_bytes: u64,
}

impl DiscoveredFile {
    /// Song title for this file: its name without extension
    pub fn title(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Scan a path (file or directory) for audio files
///
/// Results are sorted by path so batch reports are stable across runs.
pub fn scan(input: &Path, recursive: bool) -> Result<Vec<DiscoveredFile>> {
    if !input.exists() {
        return Err(VocalprepError::FileNotFound(input.to_path_buf()));
    }

    let mut files = Vec::new();

    if input.is_file() {
        // Single file mode
        match try_discover_file(input) {
            Some(file) => files.push(file),
            None => {
                return Err(VocalprepError::ValidationError(format!(
                    "unsupported audio format: {} (supported formats: {})",
                    input.display(),
                    crate::error::SUPPORTED_FORMATS
                )));
            }
        }
    } else if input.is_dir() {
        let walker = if recursive {
            WalkDir::new(input)
        } else {
            WalkDir::new(input).max_depth(1)
        };

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() {
                if let Some(file) = try_discover_file(path) {
                    debug!(
                        "Discovered: {} ({:?}, {} bytes)",
                        file.path.display(),
                        file.format,
                        file.size_bytes
                    );
                    files.push(file);
                }
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    info!("Discovered {} audio files", files.len());

    if files.is_empty() {
        warn!("No supported audio files found in {}", input.display());
    }

    Ok(files)
}

/// Try to create a DiscoveredFile if the path is a supported audio format
fn try_discover_file(path: &Path) -> Option<DiscoveredFile> {
    let ext = path.extension()?.to_str()?;
    let format = AudioFormat::from_extension(ext)?;

    let metadata = std::fs::metadata(path).ok()?;

    Some(DiscoveredFile {
        path: path.to_path_buf(),
        format,
        size_bytes: metadata.len(),
    })
}
