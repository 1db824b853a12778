//! ONNX Runtime based separation engine
//!
//! Runs HTDemucs-style waveform models. The model receives `(1, 2, samples)`
//! and returns `(1, stems, 2, samples)`. Two-stem models are read as
//! `[vocals, accompaniment]`; four-stem models as `[vocals, drums, bass, other]`
//! with the last three summed into the accompaniment.

use super::chunking::{chunk_audio, overlap_add, ChunkConfig, StemChunk};
use super::traits::{SeparationEngine, StemSet};
use crate::error::{Result, VocalprepError};
use crate::types::StereoBuffer;
use ndarray::Array3;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sample rate HTDemucs models are trained at
pub const MODEL_SAMPLE_RATE: u32 = 44100;

/// Separation engine backed by an ONNX Runtime session
pub struct OrtSeparationEngine {
    session: Session,
    model_path: PathBuf,
    chunking: ChunkConfig,
}

impl OrtSeparationEngine {
    /// Load a model and create the inference session
    pub fn new(model_path: &Path) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| {
                VocalprepError::engine_unavailable(format!(
                    "Failed to create ORT session builder: {}",
                    e
                ))
            })?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(|e| {
                VocalprepError::engine_unavailable(format!(
                    "Failed to configure CPU provider: {}",
                    e
                ))
            })?
            .commit_from_file(model_path)
            .map_err(|e| {
                VocalprepError::engine_unavailable(format!(
                    "Failed to load model {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        info!("Separation model loaded from {}", model_path.display());

        Ok(Self {
            session,
            model_path: model_path.to_path_buf(),
            chunking: ChunkConfig::htdemucs(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl SeparationEngine for OrtSeparationEngine {
    fn separate(&mut self, audio: &StereoBuffer) -> Result<StemSet> {
        if audio.is_empty() {
            return Err(VocalprepError::engine_error("cannot separate empty audio"));
        }
        if audio.sample_rate != MODEL_SAMPLE_RATE {
            return Err(VocalprepError::engine_error(format!(
                "model expects {}Hz input, got {}Hz",
                MODEL_SAMPLE_RATE, audio.sample_rate
            )));
        }

        let total_samples = audio.len();
        let chunks = chunk_audio(audio, &self.chunking);
        info!(
            "Separating {:.2}s of audio in {} chunks",
            audio.duration,
            chunks.len()
        );

        let mut stem_chunks = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            debug!("Processing chunk {}/{}", chunk.index + 1, chunks.len());
            stem_chunks.push(StemChunk {
                index: chunk.index,
                start_sample: chunk.start_sample,
                stems: run_chunk(&mut self.session, &chunk.audio)?,
            });
        }

        overlap_add(&stem_chunks, &self.chunking, total_samples)
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(MODEL_SAMPLE_RATE)
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// Run inference on one chunk
fn run_chunk(session: &mut Session, audio: &StereoBuffer) -> Result<StemSet> {
    let chunk_len = audio.len();
    let mut input_data = Array3::<f32>::zeros((1, 2, chunk_len));
    input_data
        .slice_mut(ndarray::s![0, 0, ..])
        .assign(&ndarray::ArrayView1::from(&audio.left[..chunk_len]));
    input_data
        .slice_mut(ndarray::s![0, 1, ..])
        .assign(&ndarray::ArrayView1::from(&audio.right[..chunk_len]));

    let input_tensor = Tensor::from_array(input_data).map_err(|e| {
        VocalprepError::engine_error(format!("Failed to create input tensor: {}", e))
    })?;

    let input_name = session
        .inputs
        .first()
        .map(|input| input.name.clone())
        .ok_or_else(|| VocalprepError::engine_error("Model has no input tensors defined"))?;

    let outputs = session
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| VocalprepError::engine_error(format!("Inference failed: {}", e)))?;

    let output = outputs
        .iter()
        .next()
        .map(|(_, v)| v)
        .ok_or_else(|| VocalprepError::engine_error("No output tensor from model"))?;

    let (output_shape, output_data) = output.try_extract_tensor::<f32>().map_err(|e| {
        VocalprepError::engine_error(format!("Failed to extract output tensor: {}", e))
    })?;

    let shape: Vec<i64> = output_shape.iter().copied().collect();
    stems_from_output(&shape, output_data, audio.sample_rate)
}

/// Interpret a `(1, stems, 2, samples)` row-major output tensor
fn stems_from_output(shape: &[i64], data: &[f32], sample_rate: u32) -> Result<StemSet> {
    let [batch, num_stems, channels, samples] = shape else {
        return Err(VocalprepError::engine_error(format!(
            "Expected 4D output tensor, got shape {:?}",
            shape
        )));
    };
    if *batch != 1 || *channels != 2 || *samples < 0 {
        return Err(VocalprepError::engine_error(format!(
            "Expected output shape (1, stems, 2, samples), got {:?}",
            shape
        )));
    }
    if *num_stems != 2 && *num_stems != 4 {
        return Err(VocalprepError::engine_error(format!(
            "Expected a 2-stem or 4-stem model, got {} stems (shape {:?})",
            num_stems, shape
        )));
    }

    let num_stems = *num_stems as usize;
    let samples = *samples as usize;
    let expected_len = num_stems
        .checked_mul(2)
        .and_then(|v| v.checked_mul(samples))
        .ok_or_else(|| {
            VocalprepError::engine_error(format!("Output shape {:?} overflows", shape))
        })?;
    if data.len() != expected_len {
        return Err(VocalprepError::engine_error(format!(
            "Output buffer length {} doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected_len
        )));
    }

    // Layout: stem0_left, stem0_right, stem1_left, ...
    let channel = |stem: usize, ch: usize| {
        let start = (stem * 2 + ch) * samples;
        &data[start..start + samples]
    };

    let vocals = StereoBuffer::new(channel(0, 0).to_vec(), channel(0, 1).to_vec(), sample_rate);

    let mut acc_left = vec![0.0f32; samples];
    let mut acc_right = vec![0.0f32; samples];
    for stem in 1..num_stems {
        for (acc, s) in acc_left.iter_mut().zip(channel(stem, 0)) {
            *acc += s;
        }
        for (acc, s) in acc_right.iter_mut().zip(channel(stem, 1)) {
            *acc += s;
        }
    }

    Ok(StemSet {
        vocals,
        accompaniment: StereoBuffer::new(acc_left, acc_right, sample_rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_stem_output() {
        // vocals L/R, accompaniment L/R, 3 samples each
        let data = vec![
            1.0, 1.0, 1.0, 2.0, 2.0, 2.0, //
            3.0, 3.0, 3.0, 4.0, 4.0, 4.0,
        ];
        let stems = stems_from_output(&[1, 2, 2, 3], &data, 44100).unwrap();
        assert_eq!(stems.vocals.left, vec![1.0; 3]);
        assert_eq!(stems.vocals.right, vec![2.0; 3]);
        assert_eq!(stems.accompaniment.left, vec![3.0; 3]);
        assert_eq!(stems.accompaniment.right, vec![4.0; 3]);
    }

    #[test]
    fn test_four_stem_output_sums_accompaniment() {
        let mut data = Vec::new();
        for stem in 0..4 {
            for ch in 0..2 {
                data.extend(std::iter::repeat((stem * 10 + ch) as f32).take(2));
            }
        }
        let stems = stems_from_output(&[1, 4, 2, 2], &data, 44100).unwrap();
        assert_eq!(stems.vocals.left, vec![0.0; 2]);
        assert_eq!(stems.vocals.right, vec![1.0; 2]);
        // 10 + 20 + 30 and 11 + 21 + 31
        assert_eq!(stems.accompaniment.left, vec![60.0; 2]);
        assert_eq!(stems.accompaniment.right, vec![63.0; 2]);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(stems_from_output(&[1, 2, 3], &[0.0; 6], 44100).is_err());
        assert!(stems_from_output(&[1, 3, 2, 1], &[0.0; 6], 44100).is_err());
        assert!(stems_from_output(&[1, 2, 2, 4], &[0.0; 6], 44100).is_err());
    }
}
