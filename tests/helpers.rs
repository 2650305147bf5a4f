//! Test helper utilities for building raw ADC byte streams
//!
//! The builders produce the exact wire format the worker's block reader
//! consumes: a preamble (`n_ch: u32 LE` + per-channel `f64 LE` scales)
//! followed by blocks of `[n_samp, n_ch]` headers and interleaved `i32 LE`
//! raw samples.

#![allow(dead_code)]

/// Interleave one block from per-channel constant values.
///
/// # Arguments
/// * `n_samp` - Rows in the block
/// * `per_channel` - One raw value per channel, repeated for every row
pub fn interleaved_constant(n_samp: usize, per_channel: &[i32]) -> Vec<i32> {
    let n_ch = per_channel.len();
    let mut data = Vec::with_capacity(n_samp * n_ch);
    for _ in 0..n_samp {
        data.extend_from_slice(per_channel);
    }
    data
}

/// Interleave one block where channel 0 carries `ch0` and every other
/// channel stays at zero.
pub fn interleaved_ch0(ch0: &[i32], n_ch: usize) -> Vec<i32> {
    let mut data = vec![0i32; ch0.len() * n_ch];
    for (i, &v) in ch0.iter().enumerate() {
        data[i * n_ch] = v;
    }
    data
}

/// Encode a preamble plus blocks into the front-end wire format.
pub fn encode_stream(scales: &[f64], blocks: &[Vec<i32>], n_samp: usize) -> Vec<u8> {
    let n_ch = scales.len();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(n_ch as u32).to_le_bytes());
    for s in scales {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    for block in blocks {
        assert_eq!(block.len(), n_samp * n_ch, "block geometry mismatch");
        bytes.extend_from_slice(&(n_samp as u32).to_le_bytes());
        bytes.extend_from_slice(&(n_ch as u32).to_le_bytes());
        for v in block {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaved_constant_layout() {
        let data = interleaved_constant(3, &[1, 2]);
        assert_eq!(data, vec![1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn test_interleaved_ch0_layout() {
        let data = interleaved_ch0(&[5, 6], 4);
        assert_eq!(data, vec![5, 0, 0, 0, 6, 0, 0, 0]);
    }

    #[test]
    fn test_encode_stream_length() {
        let bytes = encode_stream(&[1.0; 8], &[vec![0; 16]], 2);
        // preamble: 4 + 8*8, block: 8 + 16*4
        assert_eq!(bytes.len(), 4 + 64 + 8 + 64);
    }
}
