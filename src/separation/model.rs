//! Separation model lookup
//!
//! Model resolution checks multiple common locations automatically.

use crate::error::{Result, VocalprepError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Model filename searched for in the default locations
pub const DEFAULT_MODEL_FILENAME: &str = "htdemucs.ort";

/// Environment variable holding an explicit model path
pub const MODEL_PATH_ENV: &str = "VOCALPREP_MODEL_PATH";

/// Find the model file
///
/// Search order:
/// 1. The explicit path, if given (it must exist)
/// 2. `VOCALPREP_MODEL_PATH` environment variable (it must exist)
/// 3. ProjectDirs cache: ~/.cache/vocalprep/models/ (Linux)
///    or ~/Library/Caches/com.vocalprep.vocalprep/models/ (macOS)
/// 4. ProjectDirs data: ~/.local/share/vocalprep/models/ (Linux XDG)
/// 5. Current directory: ./models/
///
/// Returns the first existing model path found, or an error listing all checked locations.
pub fn find_model_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return require_existing(path, "--model");
    }

    if let Some(env_path) = std::env::var_os(MODEL_PATH_ENV).map(PathBuf::from) {
        return require_existing(&env_path, MODEL_PATH_ENV);
    }

    let mut checked_locations: Vec<PathBuf> = Vec::new();

    if let Some(proj_dirs) = ProjectDirs::from("com", "vocalprep", "vocalprep") {
        checked_locations.push(proj_dirs.cache_dir().join("models").join(DEFAULT_MODEL_FILENAME));
        checked_locations.push(proj_dirs.data_dir().join("models").join(DEFAULT_MODEL_FILENAME));
    }
    checked_locations.push(PathBuf::from("./models").join(DEFAULT_MODEL_FILENAME));

    if let Some(found) = checked_locations.iter().find(|p| p.is_file()) {
        return Ok(found.canonicalize().unwrap_or_else(|_| found.clone()));
    }

    let locations_list = checked_locations
        .iter()
        .map(|loc| format!("  - {}", loc.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(VocalprepError::engine_unavailable(format!(
        "separation model not found.\n\n\
         Locations checked:\n{}\n\n\
         Pass --model /path/to/{} or set {}.",
        locations_list, DEFAULT_MODEL_FILENAME, MODEL_PATH_ENV
    )))
}

fn require_existing(path: &Path, source: &str) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(VocalprepError::engine_unavailable(format!(
            "model file from {} does not exist: {}",
            source,
            path.display()
        )))
    }
}
