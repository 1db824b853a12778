//! Writing separated stems and passthrough copies

use crate::error::{Result, VocalprepError};
use crate::types::StereoBuffer;
use std::path::Path;
use tracing::debug;

/// Write stereo audio to a 16-bit PCM WAV file
pub fn write_stereo_wav(path: &Path, audio: &StereoBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let wav_error = |e: hound::Error| match e {
        hound::Error::IoError(io) => VocalprepError::output_error(path, io),
        other => VocalprepError::OutputError {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;

    // Write interleaved stereo samples
    for (l, r) in audio.left.iter().zip(audio.right.iter()) {
        writer.write_sample(to_i16(*l)).map_err(wav_error)?;
        writer.write_sample(to_i16(*r)).map_err(wav_error)?;
    }

    writer.finalize().map_err(wav_error)?;

    debug!("Wrote {} ({:.2}s)", path.display(), audio.duration);
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Copy a file byte-for-byte
pub fn copy_verbatim(src: &Path, dst: &Path) -> Result<()> {
    std::fs::copy(src, dst).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound && !src.exists() {
            VocalprepError::FileNotFound(src.to_path_buf())
        } else {
            VocalprepError::output_error(dst, e)
        }
    })?;
    debug!("Copied {} -> {}", src.display(), dst.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_stereo_wav_roundtrip_spec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stem.wav");
        let audio = StereoBuffer::new(vec![0.5; 441], vec![-0.5; 441], 44100);

        write_stereo_wav(&path, &audio).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 882);
    }

    #[test]
    fn test_to_i16_clamps() {
        assert_eq!(to_i16(2.0), 32767);
        assert_eq!(to_i16(-2.0), -32768);
        assert_eq!(to_i16(0.0), 0);
    }

    #[test]
    fn test_write_into_missing_directory_is_output_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("stem.wav");
        let audio = StereoBuffer::new(vec![0.0; 10], vec![0.0; 10], 8000);
        let err = write_stereo_wav(&path, &audio).unwrap_err();
        assert!(matches!(err, VocalprepError::OutputError { .. }));
    }

    #[test]
    fn test_copy_verbatim_preserves_bytes() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("in.flac");
        let dst = dir.path().join("out.flac");
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        std::fs::write(&src, &bytes).unwrap();

        copy_verbatim(&src, &dst).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), bytes);
    }

    #[test]
    fn test_copy_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = copy_verbatim(&dir.path().join("missing.wav"), &dir.path().join("x.wav"))
            .unwrap_err();
        assert!(matches!(err, VocalprepError::FileNotFound(_)));
    }
}
