//! 16-bit PCM WAV serialization with a fixed 44-byte header.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::StereoBuffer;

pub const HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
/// Bytes per interleaved stereo frame.
pub const STEREO_BLOCK_ALIGN: u16 = 2 * (BITS_PER_SAMPLE / 8);

/// Quantizes one sample. Negative values scale by 32768, the rest by 32767.
#[must_use]
pub fn quantize(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32_768.0) as i16
    } else {
        (clamped * 32_767.0) as i16
    }
}

fn encode_interleaved<I>(samples: I, sample_count: usize, channels: u16, sample_rate: u32) -> Vec<u8>
where
    I: Iterator<Item = f32>,
{
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate.saturating_mul(u32::from(block_align));
    let data_size = u32::try_from(sample_count * 2).unwrap_or(u32::MAX);

    let mut bytes = Vec::with_capacity(HEADER_LEN + sample_count * 2);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36_u32.saturating_add(data_size)).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16_u32.to_le_bytes());
    bytes.extend_from_slice(&1_u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    for sample in samples {
        bytes.extend_from_slice(&quantize(sample).to_le_bytes());
    }
    bytes
}

/// Interleaves L,R,L,R into a stereo WAV.
#[must_use]
pub fn encode_stereo(buffer: &StereoBuffer) -> Vec<u8> {
    let interleaved = buffer
        .left()
        .iter()
        .zip(buffer.right())
        .flat_map(|(left, right)| [*left, *right]);
    encode_interleaved(interleaved, buffer.len() * 2, 2, buffer.sample_rate())
}

#[must_use]
pub fn encode_mono(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    encode_interleaved(samples.iter().copied(), samples.len(), 1, sample_rate)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub frames: u32,
    pub duration_seconds: f64,
}

/// Parses a WAV header and returns its shape.
pub fn inspect(bytes: &[u8]) -> Result<WavInfo> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).context("invalid wav stream")?;
    let spec = reader.spec();
    let frames = reader.duration();
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        frames,
        duration_seconds: f64::from(frames) / f64::from(spec.sample_rate.max(1)),
    })
}

/// Decodes interleaved 16-bit samples.
pub fn decode_samples(bytes: &[u8]) -> Result<Vec<i16>> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).context("invalid wav stream")?;
    reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .context("failed to decode wav samples")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantization_is_asymmetric() {
        assert_eq!(quantize(1.0), 32_767);
        assert_eq!(quantize(-1.0), -32_768);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(2.5), 32_767);
        assert_eq!(quantize(-7.0), -32_768);
        assert_eq!(quantize(0.5), 16_383);
        assert_eq!(quantize(-0.5), -16_384);
    }

    #[test]
    fn byte_rate_saturates_at_extreme_sample_rates() {
        let bytes = encode_stereo(&StereoBuffer::silent(0, 2_000_000_000));
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(
            u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            2_000_000_000
        );
        assert_eq!(
            u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]),
            u32::MAX
        );
    }

    #[test]
    fn header_layout_is_byte_exact() {
        let buffer = StereoBuffer::from_channels(vec![0.0, 1.0], vec![-1.0, 0.5], 44_100)
            .expect("equal lengths");
        let bytes = encode_stereo(&buffer);

        assert_eq!(bytes.len(), HEADER_LEN + 8);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 36 + 8);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]), 16);
        assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 2);
        assert_eq!(
            u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            44_100
        );
        assert_eq!(
            u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]),
            44_100 * 4
        );
        assert_eq!(u16::from_le_bytes([bytes[32], bytes[33]]), 4);
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]), 8);

        // L, R, L, R
        assert_eq!(&bytes[44..46], &0_i16.to_le_bytes());
        assert_eq!(&bytes[46..48], &(-32_768_i16).to_le_bytes());
        assert_eq!(&bytes[48..50], &32_767_i16.to_le_bytes());
        assert_eq!(&bytes[50..52], &16_383_i16.to_le_bytes());
    }

    #[test]
    fn empty_buffer_is_a_valid_wav() {
        let bytes = encode_stereo(&StereoBuffer::silent(0, 48_000));
        assert_eq!(bytes.len(), HEADER_LEN);

        let info = inspect(&bytes).expect("header should parse");
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 48_000);
        assert_eq!(info.frames, 0);
    }

    #[test]
    fn parsed_back_through_hound() {
        let samples: Vec<f32> = (0..1_000).map(|index| (index as f32 / 500.0) - 1.0).collect();
        let bytes = encode_mono(&samples, 22_050);

        let info = inspect(&bytes).expect("header should parse");
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 22_050);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.frames, 1_000);

        let decoded = decode_samples(&bytes).expect("samples should decode");
        for (original, decoded) in samples.iter().zip(decoded) {
            let scale = if decoded < 0 { 32_768.0 } else { 32_767.0 };
            let restored = f32::from(decoded) / scale;
            assert!((original - restored).abs() <= 1.0 / 32_767.0 + 1e-6);
        }
    }
}
