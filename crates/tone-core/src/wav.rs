//! Canonical 16-bit PCM stereo RIFF/WAVE encoding.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//!  0 "RIFF"   4 36+data   8 "WAVE"
//! 12 "fmt "  16 16       20 1 (PCM)   22 channels   24 sample rate
//! 28 byte rate   32 block align   34 bits per sample
//! 36 "data"  40 data size   44.. interleaved L/R samples
//! ```

use crate::constants::{BITS_PER_SAMPLE, CHANNELS, WAV_HEADER_LEN};
use crate::render::SampleBuffer;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use thiserror::Error;

const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;
const BLOCK_ALIGN: usize = CHANNELS as usize * BYTES_PER_SAMPLE;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("{frames} frames do not fit in a RIFF file")]
    TooLarge { frames: usize },
    #[error("writing WAV data: {0}")]
    Write(#[from] hound::Error),
}

/// A complete WAV file image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WavBytes(Vec<u8>);

impl WavBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for WavBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Quantize one float sample to i16.
///
/// Clamped to [-1, 1] first; negatives scale by 32768 and positives by 32767
/// so that +1.0 maps to `i16::MAX` without overflow.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let s = if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0) as f64
    };
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// Serialize a stereo buffer as a 16-bit PCM WAV file.
pub fn encode(buffer: &SampleBuffer) -> Result<WavBytes, WavError> {
    let frames = buffer.frames();
    let data_size = frames
        .checked_mul(BLOCK_ALIGN)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(36).is_some())
        .ok_or(WavError::TooLarge { frames })?;

    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + data_size as usize));
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for (l, r) in buffer.frame_iter() {
        writer.write_sample(quantize(l))?;
        writer.write_sample(quantize(r))?;
    }
    writer.finalize()?;

    let out = cursor.into_inner();
    log::debug!("encoded {frames} frames into {} WAV bytes", out.len());
    Ok(WavBytes(out))
}
