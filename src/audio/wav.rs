use super::Recording;
use crate::{Result, SapError};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Encode a recording as a 16-bit PCM WAV file held in memory
///
/// # Arguments
/// * `recording` - Samples (f32, range -1.0 to 1.0) with their rate and channel count
pub fn encode_wav(recording: &Recording) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: recording.channels,
        sample_rate: recording.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(|e| {
            SapError::AudioProcessingError(format!("Failed to create WAV writer: {}", e))
        })?;

        // Convert f32 samples to i16
        for &sample in &recording.samples {
            let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(sample_i16).map_err(|e| {
                SapError::AudioProcessingError(format!("Failed to write sample: {}", e))
            })?;
        }

        writer.finalize().map_err(|e| {
            SapError::AudioProcessingError(format!("Failed to finalize WAV data: {}", e))
        })?;
    }

    let bytes = cursor.into_inner();
    debug!(
        "Encoded {} samples ({:.2}s) into {} WAV bytes",
        recording.samples.len(),
        recording.duration_seconds(),
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;
    use std::f32::consts::PI;

    #[test]
    fn test_encode_wav_header_and_samples() {
        // Half a second of 440 Hz at 16 kHz
        let sample_rate = 16000;
        let samples: Vec<f32> = (0..8000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect();
        let recording = Recording::new(samples.clone(), sample_rate, 1);

        let bytes = encode_wav(&recording).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.channels, 1);

        let decoded: Vec<f32> = reader
            .samples::<i16>()
            .map(|s| s.unwrap() as f32 / i16::MAX as f32)
            .collect();
        assert_eq!(decoded.len(), samples.len());
        for (original, read) in samples.iter().zip(decoded.iter()) {
            assert!((original - read).abs() < 0.001);
        }
    }

    #[test]
    fn test_out_of_range_samples_are_clamped() {
        let recording = Recording::new(vec![2.0, -3.0], 8000, 1);
        let bytes = encode_wav(&recording).unwrap();

        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![i16::MAX, -i16::MAX]);
    }
}
