//! Raw sample conversion.
//!
//! Converts one block of raw interleaved integer samples into a planar float
//! buffer in volts. The first eight voltage-capable channels are selected; a
//! trailing timestamp channel, if the front-end appends one, is ignored. Scale
//! factors are ingested once at startup and corrected for mis-reported units
//! the way the front-end does (some devices report µV/LSB or mV/LSB through
//! the same attribute).

use tracing::info;

use crate::error::{Error, Result};
use crate::blockread::RawBlock;
use crate::CHANNELS;

/// Per-channel raw-to-volts converter.
pub struct SampleConverter {
    scales: [f64; CHANNELS],
    n_ch_in: usize,
}

impl SampleConverter {
    /// Build a converter from the scales reported by the source.
    ///
    /// Fails if fewer than eight voltage channels are available. Scales must
    /// be finite and positive.
    pub fn new(raw_scales: &[f64]) -> Result<Self> {
        if raw_scales.len() < CHANNELS {
            return Err(Error::config(format!(
                "need at least {} voltage channels, source has {}",
                CHANNELS,
                raw_scales.len()
            )));
        }

        let mut scales = [0.0; CHANNELS];
        for (c, &raw) in raw_scales.iter().take(CHANNELS).enumerate() {
            if !raw.is_finite() || raw <= 0.0 {
                return Err(Error::config(format!(
                    "channel {} scale is not a positive finite value: {}",
                    c, raw
                )));
            }
            let s = normalize_scale(raw);
            info!("ch{:02} scale={:.9e} V/LSB", c, s);
            scales[c] = s;
        }

        Ok(Self {
            scales,
            n_ch_in: raw_scales.len(),
        })
    }

    /// Number of input channels expected in raw blocks (may exceed 8).
    pub fn channels_in(&self) -> usize {
        self.n_ch_in
    }

    /// Scale factor applied to channel `c`, after unit correction.
    pub fn scale(&self, c: usize) -> f64 {
        self.scales[c]
    }

    /// Convert one raw block into `out`, planar layout: `out[c * n + i]` is
    /// sample `i` of channel `c`, where `n = block.n_samp`.
    pub fn convert(&self, block: &RawBlock, out: &mut [f32]) {
        let n = block.n_samp;
        debug_assert!(out.len() >= n * CHANNELS);
        debug_assert_eq!(block.n_ch, self.n_ch_in);
        for c in 0..CHANNELS {
            let scale = self.scales[c];
            let plane = &mut out[c * n..(c + 1) * n];
            for (i, y) in plane.iter_mut().enumerate() {
                *y = (block.data[i * block.n_ch + c] as f64 * scale) as f32;
            }
        }
    }
}

/// Heuristic unit correction: attributes reported in µV/LSB or mV/LSB are
/// brought back to V/LSB.
fn normalize_scale(s: f64) -> f64 {
    if s > 1e4 {
        s * 1e-6
    } else if s > 10.0 {
        s * 1e-3
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_channels() {
        let result = SampleConverter::new(&[1.0; 7]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_scale_rejected() {
        let mut scales = [1.0; 8];
        scales[3] = -0.5;
        assert!(SampleConverter::new(&scales).is_err());
        scales[3] = f64::NAN;
        assert!(SampleConverter::new(&scales).is_err());
    }

    #[test]
    fn test_unit_heuristic() {
        // 152.59 µV/LSB reported as 152590.0
        assert!((normalize_scale(152_590.0) - 0.152_59).abs() < 1e-9);
        // 15.26 mV/LSB reported as 15.26
        assert!((normalize_scale(15.26) - 0.015_26).abs() < 1e-9);
        // Already volts
        assert_eq!(normalize_scale(0.001), 0.001);
    }

    #[test]
    fn test_convert_planar() {
        let conv = SampleConverter::new(&[0.5; 8]).unwrap();
        let mut block = RawBlock::new(3, 8);
        for i in 0..3 {
            for c in 0..8 {
                block.data[i * 8 + c] = (i * 10 + c) as i32;
            }
        }
        let mut out = vec![0.0f32; 3 * 8];
        conv.convert(&block, &mut out);
        // Channel 2, sample 1: raw 12, scaled 6.0, planar index 2*3 + 1
        assert_eq!(out[2 * 3 + 1], 6.0);
        // Channel 0 plane is contiguous
        assert_eq!(&out[0..3], &[0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_trailing_timestamp_channel_ignored() {
        // Nine input channels: eight voltages plus a timestamp column
        let conv = SampleConverter::new(&[1.0; 9]).unwrap();
        let mut block = RawBlock::new(2, 9);
        for i in 0..2 {
            for c in 0..9 {
                block.data[i * 9 + c] = if c == 8 { 999 } else { c as i32 };
            }
        }
        let mut out = vec![0.0f32; 2 * 8];
        conv.convert(&block, &mut out);
        for c in 0..8 {
            assert_eq!(out[c * 2], c as f32);
        }
    }
}
