//! Per-track stem separation
//!
//! Produces `<prefix>_instrumental.wav`, `<prefix>_vocals.wav` and a
//! byte-identical `<prefix>_original.<ext>` inside an output directory.

use super::engine::EngineHandle;
use crate::audio;
use crate::error::{Result, VocalprepError};
use crate::types::{OutputFiles, SeparationResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Runs the shared engine for one track and manages the resulting files
pub struct TrackSeparationOrchestrator<'a> {
    engine: &'a EngineHandle,
}

impl<'a> TrackSeparationOrchestrator<'a> {
    pub fn new(engine: &'a EngineHandle) -> Self {
        Self { engine }
    }

    /// Separate a track, reporting failures inside the result
    pub fn separate(&self, input: &Path, output_dir: &Path, prefix: &str) -> SeparationResult {
        match self.try_separate(input, output_dir, prefix) {
            Ok(files) => {
                for path in files.paths() {
                    debug!("Wrote {}", path.display());
                }
                info!(
                    "Separated {} -> {}",
                    input.display(),
                    files.dj_track().display()
                );
                SeparationResult::completed(files)
            }
            Err(e) => {
                warn!("Separation failed for {}: {}", input.display(), e);
                SeparationResult::failed(&e)
            }
        }
    }

    /// Separate a track, propagating the first failure
    pub fn try_separate(&self, input: &Path, output_dir: &Path, prefix: &str) -> Result<OutputFiles> {
        if !input.is_file() {
            return Err(VocalprepError::FileNotFound(input.to_path_buf()));
        }

        std::fs::create_dir_all(output_dir)
            .map_err(|e| VocalprepError::output_error(output_dir, e))?;

        let target_rate = self.engine.required_sample_rate()?;
        let waveform = audio::decode_stereo(input, target_rate)?;
        let stems = self.engine.separate(&waveform)?;
        drop(waveform);

        let instrumental = output_dir.join(format!("{}_instrumental.wav", prefix));
        let vocals = output_dir.join(format!("{}_vocals.wav", prefix));
        let original = copy_path(input, output_dir, prefix, "original");

        audio::write_stereo_wav(&instrumental, &stems.accompaniment)?;
        audio::write_stereo_wav(&vocals, &stems.vocals)?;
        audio::copy_verbatim(input, &original)?;

        Ok(OutputFiles::Separated {
            instrumental,
            vocals,
            original,
        })
    }
}

/// `<prefix>_<suffix>.<source extension>`, defaulting to `wav`
pub(crate) fn copy_path(input: &Path, output_dir: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("wav");
    output_dir.join(format!("{}_{}.{}", prefix, suffix, ext))
}
