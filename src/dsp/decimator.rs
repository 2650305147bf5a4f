//! Integer-factor time averaging with block-boundary continuity.
//!
//! Reduces the sample rate by an integer factor, emitting the mean of each
//! group of `factor` consecutive rows. Up to `factor - 1` trailing rows that
//! do not fill a group are carried over and prepended to the next block, so
//! the decimated stream is contiguous across block boundaries: the total
//! output over N blocks differs from `total_in / factor` by at most one row.
//!
//! # Example
//!
//! ```rust
//! use voltstream::dsp::decimator::TimeAverager;
//!
//! // Average groups of 4 rows on an 8-channel stream, blocks of 64 rows
//! let mut avg = TimeAverager::new(4, 8, 64);
//! let input = vec![1.0f32; 8 * 64];
//! let mut output = vec![0.0f32; 8 * avg.max_out()];
//! let n_out = avg.process(&input, 64, &mut output, avg.max_out());
//! assert_eq!(n_out, 16);
//! assert_eq!(avg.carry_len(), 0);
//! ```

/// A decimator that averages groups of `factor` rows, carrying the remainder
/// between calls.
///
/// All buffers are planar and channel-major; plane `c` of a buffer with row
/// capacity `stride` occupies `buf[c * stride .. c * stride + rows]`.
pub struct TimeAverager {
    factor: usize,
    channels: usize,
    max_in: usize,
    /// Row capacity of `combined`: a full block plus a maximal carry.
    stride: usize,
    /// Carried rows, channel-major with row capacity `factor - 1`.
    carry: Vec<f32>,
    carry_len: usize,
    /// Concatenation scratch, allocated once.
    combined: Vec<f32>,
}

impl TimeAverager {
    /// # Arguments
    /// * `factor` - Decimation factor (must be > 0)
    /// * `channels` - Number of channels
    /// * `block_samples` - Largest per-call input row count
    ///
    /// # Panics
    /// Panics if `factor` is 0.
    pub fn new(factor: usize, channels: usize, block_samples: usize) -> Self {
        assert!(factor > 0, "Decimation factor must be greater than 0");
        let stride = block_samples + factor - 1;
        Self {
            factor,
            channels,
            max_in: block_samples,
            stride,
            carry: vec![0.0; channels * factor.saturating_sub(1)],
            carry_len: 0,
            combined: vec![0.0; channels * stride],
        }
    }

    /// The decimation factor.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Rows currently carried over; always less than the factor.
    pub fn carry_len(&self) -> usize {
        self.carry_len
    }

    /// Largest possible output row count for one call.
    pub fn max_out(&self) -> usize {
        (self.max_in + self.factor - 1) / self.factor
    }

    /// Decimate one planar block of `n_in` rows into `output` (row capacity
    /// `out_stride` per channel). Returns the number of output rows.
    pub fn process(
        &mut self,
        input: &[f32],
        n_in: usize,
        output: &mut [f32],
        out_stride: usize,
    ) -> usize {
        debug_assert!(n_in <= self.max_in);
        debug_assert!(input.len() >= self.channels * n_in);

        let total = self.carry_len + n_in;
        let n_out = total / self.factor;
        let remainder = total % self.factor;
        debug_assert!(n_out <= out_stride);

        let carry_cap = self.factor - 1;
        for c in 0..self.channels {
            let plane = &mut self.combined[c * self.stride..c * self.stride + total];
            plane[..self.carry_len]
                .copy_from_slice(&self.carry[c * carry_cap..c * carry_cap + self.carry_len]);
            plane[self.carry_len..].copy_from_slice(&input[c * n_in..(c + 1) * n_in]);
        }

        for c in 0..self.channels {
            let plane = &self.combined[c * self.stride..c * self.stride + total];
            for o in 0..n_out {
                let group = &plane[o * self.factor..(o + 1) * self.factor];
                let sum: f64 = group.iter().map(|&v| v as f64).sum();
                output[c * out_stride + o] = (sum / self.factor as f64) as f32;
            }
            for r in 0..remainder {
                self.carry[c * carry_cap + r] = plane[n_out * self.factor + r];
            }
        }
        self.carry_len = remainder;

        n_out
    }

    /// Drop any carried rows.
    pub fn reset(&mut self) {
        self.carry_len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Single-channel convenience wrapper for the tests below.
    fn run(avg: &mut TimeAverager, input: &[f32]) -> Vec<f32> {
        let max_out = avg.max_out();
        let mut output = vec![0.0f32; max_out];
        let n_out = avg.process(input, input.len(), &mut output, max_out);
        output.truncate(n_out);
        output
    }

    #[test]
    fn test_carry_over_two_blocks() {
        // Block A: [1..7] with factor 3 -> means [2, 5], carry [7]
        // Block B: [8, 9, 10] -> combined [7, 8, 9, 10] -> mean [8], carry [10]
        let mut avg = TimeAverager::new(3, 1, 7);

        let out_a = run(&mut avg, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(out_a, vec![2.0, 5.0]);
        assert_eq!(avg.carry_len(), 1);

        let out_b = run(&mut avg, &[8.0, 9.0, 10.0]);
        assert_eq!(out_b, vec![8.0]);
        assert_eq!(avg.carry_len(), 1);
    }

    #[test]
    fn test_carry_invariant() {
        let mut avg = TimeAverager::new(5, 1, 13);
        let mut total_in = 0usize;
        let mut total_out = 0usize;
        for len in [13usize, 1, 7, 13, 4, 9] {
            let input: Vec<f32> = (0..len).map(|i| i as f32).collect();
            total_in += len;
            total_out += run(&mut avg, &input).len();
            assert!(avg.carry_len() < avg.factor());
            assert_eq!(total_in, total_out * 5 + avg.carry_len());
        }
    }

    #[test]
    fn test_factor_one_passthrough() {
        let mut avg = TimeAverager::new(1, 1, 8);
        let input = [1.0, 2.0, 3.0];
        let out = run(&mut avg, &input);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
        assert_eq!(avg.carry_len(), 0);
    }

    #[test]
    fn test_multi_channel_independent() {
        let mut avg = TimeAverager::new(2, 2, 4);
        // Channel 0: [1, 3, 5, 7]; channel 1: [10, 20, 30, 40]
        let input = [1.0, 3.0, 5.0, 7.0, 10.0, 20.0, 30.0, 40.0];
        let max_out = avg.max_out();
        let mut output = vec![0.0f32; 2 * max_out];
        let n_out = avg.process(&input, 4, &mut output, max_out);
        assert_eq!(n_out, 2);
        assert_relative_eq!(output[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(output[1], 6.0, epsilon = 1e-6);
        assert_relative_eq!(output[max_out], 15.0, epsilon = 1e-6);
        assert_relative_eq!(output[max_out + 1], 35.0, epsilon = 1e-6);
    }

    #[test]
    fn test_short_block_emits_nothing() {
        let mut avg = TimeAverager::new(10, 1, 16);
        let out = run(&mut avg, &[1.0, 2.0, 3.0]);
        assert!(out.is_empty());
        assert_eq!(avg.carry_len(), 3);
    }

    #[test]
    fn test_reset_clears_carry() {
        let mut avg = TimeAverager::new(4, 1, 8);
        let _ = run(&mut avg, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(avg.carry_len(), 2);
        avg.reset();
        assert_eq!(avg.carry_len(), 0);
        // After a reset the next block stands alone
        let out = run(&mut avg, &[4.0, 4.0, 4.0, 4.0]);
        assert_eq!(out, vec![4.0]);
    }
}
