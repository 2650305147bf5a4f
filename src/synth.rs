//! Deterministic synthetic ADC source.
//!
//! Generates per-channel sine waves as raw integer samples, for bring-up
//! without hardware and for end-to-end tests. Channel `c` carries a sine at
//! `BASE_FREQ_HZ + 10 * c` Hz; the per-channel scale maps full amplitude to
//! one volt. The generator is a pure function of the running sample index, so
//! two instances produce identical streams.

use std::f64::consts::PI;

use crate::blockread::{RawBlock, SourceInfo};

const BASE_FREQ_HZ: f64 = 1_000.0;

/// Raw amplitude in counts; the scale factor is its reciprocal.
const AMPLITUDE: f64 = 1_048_576.0;

pub struct SyntheticAdc {
    fs: f64,
    channels: usize,
    info: SourceInfo,
    /// Running sample index across blocks.
    n: u64,
}

impl SyntheticAdc {
    pub fn new(fs: f64, channels: usize) -> Self {
        let info = SourceInfo {
            channels,
            scales: vec![1.0 / AMPLITUDE; channels],
        };
        Self {
            fs,
            channels,
            info,
            n: 0,
        }
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    /// Refill `block` with the next window of samples. Never fails and never
    /// ends; the front-end it stands in for streams forever.
    pub fn refill(&mut self, block: &mut RawBlock) {
        debug_assert_eq!(block.n_ch, self.channels);
        for i in 0..block.n_samp {
            let t = (self.n + i as u64) as f64 / self.fs;
            for c in 0..self.channels {
                let f = BASE_FREQ_HZ + 10.0 * c as f64;
                let v = (2.0 * PI * f * t).sin() * AMPLITUDE;
                block.data[i * self.channels + c] = v as i32;
            }
        }
        self.n += block.n_samp as u64;
    }
}
