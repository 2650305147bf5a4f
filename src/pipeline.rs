//! The staged DSP worker core.
//!
//! One [`Pipeline`] owns the parameter snapshot, the per-stage state and
//! every scratch buffer, all allocated at construction; processing a block
//! allocates nothing. Per block the stages run in a fixed order (convert,
//! filter, smooth, decimate, ratio, correct) and the five typed frames are
//! emitted Stage3, Stage5, Stage7, Stage8, Stage9, each flushed, only when
//! the decimator produced at least one row. Frames for a later block never
//! interleave with an earlier block.

use std::io::Write;

use crate::blockread::RawBlock;
use crate::convert::SampleConverter;
use crate::dsp::biquad::{lowpass_sections, FilterBank};
use crate::dsp::decimator::TimeAverager;
use crate::dsp::ratio::RatioLogger;
use crate::dsp::smoother::ChannelSmoother;
use crate::dsp::ychain;
use crate::error::Result;
use crate::frame::{FrameKind, FrameWriter};
use crate::params::{Command, Params};
use crate::trace::TraceSink;
use crate::{CHANNELS, QUADS};

/// Scratch buffers sized at startup; never reallocated afterwards.
struct WorkBuffers {
    raw_planar: Vec<f32>,
    lpf_planar: Vec<f32>,
    smoothed_planar: Vec<f32>,
    decim_out: Vec<f32>,
    r_buf: Vec<f32>,
    ravg_buf: Vec<f32>,
    y2_out: Vec<f32>,
    y3_out: Vec<f32>,
    yt_out: Vec<f32>,
}

impl WorkBuffers {
    fn new(block_samples: usize, max_out: usize) -> Self {
        Self {
            raw_planar: vec![0.0; CHANNELS * block_samples],
            lpf_planar: vec![0.0; CHANNELS * block_samples],
            smoothed_planar: vec![0.0; CHANNELS * block_samples],
            decim_out: vec![0.0; CHANNELS * max_out],
            r_buf: vec![0.0; QUADS * max_out],
            ravg_buf: vec![0.0; QUADS * max_out],
            y2_out: vec![0.0; QUADS * max_out],
            y3_out: vec![0.0; QUADS * max_out],
            yt_out: vec![0.0; QUADS * max_out],
        }
    }
}

pub struct Pipeline {
    params: Params,
    block_samples: usize,
    max_out: usize,
    converter: SampleConverter,
    filter: FilterBank,
    smoother: ChannelSmoother,
    averager: TimeAverager,
    ratio: RatioLogger,
    bufs: WorkBuffers,
    writer: FrameWriter,
    /// Running decimated-row index for the textual trace.
    rows_traced: u64,
}

impl Pipeline {
    /// Build the pipeline from a validated parameter snapshot and the scale
    /// factors reported by the source.
    pub fn new(params: Params, block_samples: usize, scales: &[f64]) -> Result<Self> {
        params.validate()?;
        let decim = params.decim();
        let converter = SampleConverter::new(scales)?;
        let filter = FilterBank::new(lowpass_sections(
            params.lpf_cutoff_hz,
            params.sampling_frequency,
        ));
        let smoother = ChannelSmoother::new(params.movavg_ch, block_samples);
        let averager = TimeAverager::new(decim, CHANNELS, block_samples);
        let max_out = averager.max_out();
        let ratio = RatioLogger::new(
            params.alpha * params.beta * params.gamma,
            params.k,
            params.b,
            params.r_abs,
            params.movavg_r,
            max_out,
        );
        let bufs = WorkBuffers::new(block_samples, max_out);
        let writer = FrameWriter::new(CHANNELS * max_out);

        Ok(Self {
            params,
            block_samples,
            max_out,
            converter,
            filter,
            smoother,
            averager,
            ratio,
            bufs,
            writer,
            rows_traced: 0,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Rows currently carried over by the decimator.
    pub fn carry_len(&self) -> usize {
        self.averager.carry_len()
    }

    /// Apply a hot-reload command between blocks. Filter state, carry-over
    /// and smoothing windows are untouched.
    pub fn apply_command(&mut self, cmd: Command) {
        self.params.apply(cmd);
    }

    /// Process one raw block: run every stage, emit the frames, write the
    /// trace lines. Returns the number of decimated rows produced.
    pub fn process_block<W: Write>(
        &mut self,
        block: &RawBlock,
        out: &mut W,
        trace: &mut TraceSink,
    ) -> Result<usize> {
        let n = self.block_samples;
        debug_assert_eq!(block.n_samp, n);
        let bufs = &mut self.bufs;

        self.converter.convert(block, &mut bufs.raw_planar);
        self.filter.process(&bufs.raw_planar, &mut bufs.lpf_planar, n);
        self.smoother
            .smooth_planar(&bufs.lpf_planar, &mut bufs.smoothed_planar, CHANNELS, n, n);
        let n_out = self
            .averager
            .process(&bufs.smoothed_planar, n, &mut bufs.decim_out, self.max_out);

        if n_out == 0 {
            return Ok(0);
        }

        self.ratio.process(
            &bufs.decim_out,
            n_out,
            self.max_out,
            &mut bufs.r_buf,
            &mut bufs.ravg_buf,
            self.max_out,
        );
        ychain::evaluate(
            &self.params,
            &bufs.ravg_buf,
            n_out,
            self.max_out,
            &mut bufs.y2_out,
            &mut bufs.y3_out,
            &mut bufs.yt_out,
        );

        let stride = self.max_out;
        self.writer
            .write_planar(out, FrameKind::Stage3, n_out, &bufs.decim_out, stride)?;
        self.writer
            .write_planar(out, FrameKind::Stage5, n_out, &bufs.ravg_buf, stride)?;
        self.writer
            .write_planar(out, FrameKind::Stage7, n_out, &bufs.y2_out, stride)?;
        self.writer
            .write_planar(out, FrameKind::Stage8, n_out, &bufs.y3_out, stride)?;
        self.writer
            .write_planar(out, FrameKind::Stage9, n_out, &bufs.yt_out, stride)?;

        for t in 0..n_out {
            let row = [
                bufs.yt_out[t],
                bufs.yt_out[stride + t],
                bufs.yt_out[2 * stride + t],
                bufs.yt_out[3 * stride + t],
            ];
            trace.write_row(self.rows_traced, &row);
            self.rows_traced += 1;
        }

        Ok(n_out)
    }
}
