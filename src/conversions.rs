//! # PCM Wire Conversions
//!
//! The transport carries signed 16-bit samples packed contiguously in
//! little-endian order. These helpers move between that byte layout and
//! `i16` sample slices without allocating, so they can run on the receive
//! path directly.
//!
//! ```rust
//! use pcm_bridge::conversions::{decode_le_i16, encode_le_i16};
//!
//! let bytes = [0x64, 0x00, 0xff, 0xff, 0x01];
//! let mut samples = [0i16; 4];
//! let decoded = decode_le_i16(&bytes, &mut samples);
//! assert_eq!(decoded.samples, 2);
//! assert_eq!(&samples[..2], &[100, -1]);
//! // The odd trailing byte is not a whole sample.
//! assert_eq!(decoded.discarded_bytes, 1);
//!
//! let mut wire = [0u8; 4];
//! assert_eq!(encode_le_i16(&samples[..2], &mut wire), 4);
//! assert_eq!(&wire, &bytes[..4]);
//! ```

use crate::config::SAMPLE_WIDTH;
use std::borrow::Cow;

/// Outcome of decoding one byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decoded {
    /// Samples written to the output slice.
    pub samples: usize,
    /// Bytes of the input consumed by those samples.
    pub consumed_bytes: usize,
    /// Trailing bytes that did not form a whole sample. Only non-zero when the
    /// output slice had room for every whole sample in the input.
    pub discarded_bytes: usize,
}

/// Decode little-endian i16 samples from `bytes` into `out`.
///
/// Decodes as many whole samples as fit in `out`. A trailing partial sample is
/// reported in [`Decoded::discarded_bytes`] rather than treated as an error.
#[inline]
pub fn decode_le_i16(bytes: &[u8], out: &mut [i16]) -> Decoded {
    let whole = bytes.len() / SAMPLE_WIDTH;
    let samples = whole.min(out.len());

    for (slot, pair) in out[..samples]
        .iter_mut()
        .zip(bytes.chunks_exact(SAMPLE_WIDTH))
    {
        *slot = i16::from_le_bytes([pair[0], pair[1]]);
    }

    let consumed_bytes = samples * SAMPLE_WIDTH;
    let discarded_bytes = if samples == whole {
        bytes.len() - consumed_bytes
    } else {
        0
    };

    Decoded {
        samples,
        consumed_bytes,
        discarded_bytes,
    }
}

/// Encode `samples` as little-endian bytes into `out`.
///
/// Returns the number of bytes written, which is `2 * n` for the first `n`
/// samples that fit.
#[inline]
pub fn encode_le_i16(samples: &[i16], out: &mut [u8]) -> usize {
    let count = samples.len().min(out.len() / SAMPLE_WIDTH);
    for (pair, sample) in out.chunks_exact_mut(SAMPLE_WIDTH).zip(&samples[..count]) {
        pair.copy_from_slice(&sample.to_le_bytes());
    }
    count * SAMPLE_WIDTH
}

/// View `samples` as little-endian bytes.
///
/// Borrows on little-endian targets and only allocates when a byte swap is required.
pub fn samples_as_le_bytes(samples: &[i16]) -> Cow<'_, [u8]> {
    if cfg!(target_endian = "little") {
        Cow::Borrowed(bytemuck::cast_slice(samples))
    } else {
        let mut bytes = vec![0u8; samples.len() * SAMPLE_WIDTH];
        encode_le_i16(samples, &mut bytes);
        Cow::Owned(bytes)
    }
}

/// Quantise a float sample in [-1.0, 1.0] to i16, clamping anything outside that range.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Quantise a float slice into `out`, returning how many samples were written.
pub fn f32_slice_to_i16(input: &[f32], out: &mut [i16]) -> usize {
    let count = input.len().min(out.len());
    for (slot, &sample) in out.iter_mut().zip(input) {
        *slot = f32_to_i16(sample);
    }
    count
}
