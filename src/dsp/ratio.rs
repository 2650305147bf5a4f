//! Log-ratio lanes over sensor/standard channel quads.
//!
//! The eight decimated channels pair into four lanes: sensor channels
//! `{0, 2, 4, 6}` against standard channels `{1, 3, 5, 7}`. Each lane
//! computes a scaled, biased base-`k` logarithm of the sensor/standard
//! ratio, with both operands clamped away from zero so the output is always
//! finite, then a centered moving average at the decimated rate.

use crate::dsp::smoother::ChannelSmoother;
use crate::QUADS;

/// Floor applied to both ratio operands before the logarithm.
const EPS: f64 = 1e-12;

/// Computes `R = (alpha * beta * gamma) * log_k(sensor / standard) + b` per
/// lane and row, followed by the Ravg moving average.
pub struct RatioLogger {
    scale: f64,
    bias: f64,
    /// Precomputed `ln(k)`; `k > 1` is validated at startup.
    ln_k: f64,
    r_abs: bool,
    smoother: ChannelSmoother,
}

impl RatioLogger {
    /// # Arguments
    /// * `scale` - `alpha * beta * gamma`
    /// * `k` - Logarithm base, must be > 1
    /// * `bias` - Additive offset `b`
    /// * `r_abs` - Rectify both operands before the ratio
    /// * `movavg_r` - Ravg window length at the decimated rate
    /// * `max_out` - Largest decimated row count per block
    ///
    /// # Panics
    /// Panics if `k <= 1` (callers validate this in `Params`).
    pub fn new(scale: f64, k: f64, bias: f64, r_abs: bool, movavg_r: usize, max_out: usize) -> Self {
        assert!(k > 1.0, "Log base k must be greater than 1");
        Self {
            scale,
            bias,
            ln_k: k.ln(),
            r_abs,
            smoother: ChannelSmoother::new(movavg_r, max_out),
        }
    }

    /// Compute R and Ravg for all lanes over `n_out` decimated rows.
    ///
    /// `decim` is the planar 8-channel decimated buffer with row capacity
    /// `in_stride`; `r_buf` and `ravg` are planar 4-lane buffers with row
    /// capacity `out_stride`.
    pub fn process(
        &mut self,
        decim: &[f32],
        n_out: usize,
        in_stride: usize,
        r_buf: &mut [f32],
        ravg: &mut [f32],
        out_stride: usize,
    ) {
        for q in 0..QUADS {
            let sensor = &decim[(2 * q) * in_stride..(2 * q) * in_stride + n_out];
            let standard = &decim[(2 * q + 1) * in_stride..(2 * q + 1) * in_stride + n_out];
            let lane = &mut r_buf[q * out_stride..q * out_stride + n_out];
            for ((y, &top_raw), &bot_raw) in
                lane.iter_mut().zip(sensor.iter()).zip(standard.iter())
            {
                let mut top = top_raw as f64;
                let mut bot = bot_raw as f64;
                if self.r_abs {
                    top = top.abs();
                    bot = bot.abs();
                }
                top = top.max(EPS);
                bot = bot.max(EPS);
                let r = self.scale * ((top / bot).ln() / self.ln_k) + self.bias;
                *y = r as f32;
            }
        }

        self.smoother
            .smooth_planar(r_buf, ravg, QUADS, n_out, out_stride);
    }
}
