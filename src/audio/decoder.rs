//! Audio decoding using symphonia
//!
//! `decode` keeps the source's native sample rate and channel layout for
//! analysis. `decode_stereo` prepares the waveform a separation engine asks
//! for, using rubato when the engine needs a specific sample rate.

use crate::error::{Result, VocalprepError};
use crate::types::{AudioAsset, StereoBuffer};
use rubato::{FftFixedInOut, Resampler};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace};

/// Maximum file size we'll attempt to decode (2GB)
/// Prevents OOM on extremely large files
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Decode an audio file at its native sample rate, keeping every channel
pub fn decode(path: &Path) -> Result<AudioAsset> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VocalprepError::FileNotFound(path.to_path_buf())
        } else {
            VocalprepError::decode_error(path, format!("Failed to read file metadata: {}", e))
        }
    })?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(VocalprepError::decode_error(
            path,
            format!(
                "File too large ({:.1} GB). Maximum supported size is 2 GB.",
                metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0)
            ),
        ));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| VocalprepError::decode_error(path, format!("Failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Provide a hint based on file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| VocalprepError::decode_error(path, format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| VocalprepError::decode_error(path, "No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);

    debug!(
        "Decoding: {} @ {}Hz, {} channels",
        path.display(),
        sample_rate,
        channels
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| {
            VocalprepError::decode_error(path, format!("Failed to create decoder: {}", e))
        })?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // End of stream
            }
            Err(e) => {
                return Err(VocalprepError::decode_error(
                    path,
                    format!("Failed to read packet: {}", e),
                ));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                trace!("Skipping corrupted frame: {}", e);
                continue;
            }
            Err(e) => {
                return Err(VocalprepError::decode_error(path, format!("Decode error: {}", e)));
            }
        };

        // Codec parameters may omit the layout; the decoded spec is authoritative
        let spec = *decoded.spec();
        if channels == 0 {
            channels = spec.channels.count();
        }
        if sample_rate == 0 {
            sample_rate = spec.rate;
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() || channels == 0 {
        return Err(VocalprepError::decode_error(path, "No audio samples decoded"));
    }
    if sample_rate == 0 {
        return Err(VocalprepError::decode_error(path, "Unknown sample rate"));
    }

    let channels = u16::try_from(channels).map_err(|_| {
        VocalprepError::decode_error(path, format!("Unsupported channel count {}", channels))
    })?;

    let asset = AudioAsset::new(path.to_path_buf(), samples, sample_rate, channels);

    debug!(
        "Decoded {} frames ({:.2}s) from {}",
        asset.frames(),
        asset.duration(),
        path.display()
    );

    Ok(asset)
}

/// Decode an audio file to stereo for a separation engine
///
/// Mono sources are duplicated onto both channels and multi-channel sources are
/// folded to their front pair. When `target_rate` is set the waveform is
/// resampled to it; otherwise the native rate is kept.
pub fn decode_stereo(path: &Path, target_rate: Option<u32>) -> Result<StereoBuffer> {
    let asset = decode(path)?;
    let source_rate = asset.sample_rate;
    let channels = asset.channels as usize;

    let stereo = match channels {
        1 => StereoBuffer::new(asset.samples.clone(), asset.samples, source_rate),
        2 => StereoBuffer::from_interleaved(&asset.samples, source_rate),
        _ => StereoBuffer::from_interleaved(&downmix_to_stereo(&asset.samples, channels), source_rate),
    };

    let stereo = match target_rate {
        Some(rate) if rate != source_rate => {
            debug!("Resampling {}Hz -> {}Hz for separation", source_rate, rate);
            let left = resample(&stereo.left, source_rate, rate);
            let right = resample(&stereo.right, source_rate, rate);
            StereoBuffer::new(left, right, rate)
        }
        _ => stereo,
    };

    debug!(
        "Decoded stereo {} samples ({:.2}s)",
        stereo.len(),
        stereo.duration
    );

    Ok(stereo)
}

/// Fold multi-channel audio to its front left/right pair
fn downmix_to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 2 {
        return samples.to_vec();
    }

    // For 5.1 surround: FL, FR, FC, LFE, BL, BR - keep the front pair
    samples
        .chunks_exact(channels)
        .flat_map(|frame| [frame[0], frame[1]])
        .collect()
}

/// FFT-based resampling using rubato
///
/// Uses a proper anti-aliasing filter. Falls back to linear interpolation if
/// rubato cannot be initialized for the requested ratio.
pub(crate) fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    // rubato works on fixed-size chunks
    const CHUNK_SIZE: usize = 1024;

    let mut resampler = match FftFixedInOut::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        1, // mono channel
    ) {
        Ok(r) => r,
        Err(e) => {
            debug!("Rubato initialization failed ({}), using fallback", e);
            return resample_linear_fallback(samples, from_rate, to_rate);
        }
    };

    let input_frames_per_chunk = resampler.input_frames_next();
    let output_frames_per_chunk = resampler.output_frames_next();

    let ratio = to_rate as f64 / from_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).round() as usize;
    let mut output = Vec::with_capacity(expected_len + output_frames_per_chunk);

    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + input_frames_per_chunk).min(samples.len());
        let mut chunk = samples[pos..end].to_vec();

        // Pad last chunk if needed
        if chunk.len() < input_frames_per_chunk {
            chunk.resize(input_frames_per_chunk, 0.0);
        }

        match resampler.process(&[chunk], None) {
            Ok(resampled) => {
                if let Some(channel) = resampled.first() {
                    output.extend_from_slice(channel);
                }
            }
            Err(e) => {
                debug!("Rubato processing error ({}), using fallback for remaining", e);
                output.extend(resample_linear_fallback(&samples[pos..], from_rate, to_rate));
                break;
            }
        }

        pos += input_frames_per_chunk;
    }

    // Drop the tail produced by zero padding
    output.truncate(expected_len);
    output
}

/// Linear interpolation resampler, used only when rubato is unavailable
fn resample_linear_fallback(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < samples.len() {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else {
            samples[src_idx.min(samples.len() - 1)]
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_keeps_front_pair() {
        // Two frames of 6-channel audio
        let surround = vec![
            0.1, 0.2, 0.9, 0.9, 0.9, 0.9, //
            0.3, 0.4, 0.9, 0.9, 0.9, 0.9,
        ];
        let stereo = downmix_to_stereo(&surround, 6);
        assert_eq!(stereo, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let result = resample(&samples, 44100, 44100);
        assert_eq!(result, samples);
    }

    #[test]
    fn test_resample_upsample_length() {
        let samples: Vec<f32> = (0..4000).map(|i| (i as f32 / 4000.0).sin()).collect();
        let result = resample(&samples, 22050, 44100);
        assert_eq!(result.len(), 8000);
    }

    #[test]
    fn test_resample_sine_wave_integrity() {
        use std::f32::consts::PI;
        let samples: Vec<f32> = (0..4000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();

        let result = resample(&samples, 44100, 22050);

        let max_val = result.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_val = result.iter().cloned().fold(f32::INFINITY, f32::min);
        assert!(max_val > 0.9, "Max value {} should be > 0.9", max_val);
        assert!(min_val < -0.9, "Min value {} should be < -0.9", min_val);
    }

    #[test]
    fn test_resample_fallback_works() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let result = resample_linear_fallback(&samples, 44100, 22050);
        assert!((result.len() as f64 - 50.0).abs() < 2.0);
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode(Path::new("/nonexistent/track.wav")).unwrap_err();
        assert!(matches!(err, VocalprepError::FileNotFound(_)));
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"This is not a valid WAV file content!!!!!").unwrap();
        let err = decode(&path).unwrap_err();
        assert!(matches!(err, VocalprepError::DecodeError { .. }));
    }

    #[test]
    fn test_decode_preserves_channels_and_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 32000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..3200 {
            writer.write_sample((i % 100) as i16 * 100).unwrap();
            writer.write_sample(-((i % 100) as i16) * 100).unwrap();
        }
        writer.finalize().unwrap();

        let asset = decode(&path).unwrap();
        assert_eq!(asset.channels, 2);
        assert_eq!(asset.sample_rate, 32000);
        assert_eq!(asset.frames(), 3200);
        assert!((asset.duration() - 0.1).abs() < 1e-9);

        let stereo = decode_stereo(&path, Some(16000)).unwrap();
        assert_eq!(stereo.sample_rate, 16000);
        assert_eq!(stereo.len(), 1600);
    }
}
