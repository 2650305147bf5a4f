//! Typed binary frames.
//!
//! Each frame on the primary output is `1 + 8 + n_samp * n_ch * 4` bytes: a
//! one-byte type tag, two little-endian `u32` header fields (`n_samp`,
//! `n_ch`), then `n_samp * n_ch` little-endian IEEE-754 `f32` values in
//! row-major order. There is no framing magic and no length prefix beyond the
//! header; parsers must know the per-type channel count. The parse side here
//! serves the frame-consuming broker and the round-trip tests.

use std::io::{self, Read, Write};

/// Frame type tags, one per pipeline output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Post-decimation 8-channel signal (tag 1).
    Stage3,
    /// Smoothed log-ratios, 4 lanes (tag 2).
    Stage5,
    /// Second correction stage y2, 4 lanes (tag 4).
    Stage7,
    /// Third correction stage y3, 4 lanes (tag 5).
    Stage8,
    /// Final corrected output yt, 4 lanes (tag 3).
    Stage9,
}

impl FrameKind {
    /// Wire tag for this frame type.
    pub fn tag(self) -> u8 {
        match self {
            FrameKind::Stage3 => 1,
            FrameKind::Stage5 => 2,
            FrameKind::Stage9 => 3,
            FrameKind::Stage7 => 4,
            FrameKind::Stage8 => 5,
        }
    }

    /// Inverse of [`FrameKind::tag`].
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(FrameKind::Stage3),
            2 => Some(FrameKind::Stage5),
            3 => Some(FrameKind::Stage9),
            4 => Some(FrameKind::Stage7),
            5 => Some(FrameKind::Stage8),
            _ => None,
        }
    }

    /// Channel count carried by this frame type.
    pub fn channels(self) -> u32 {
        match self {
            FrameKind::Stage3 => 8,
            _ => 4,
        }
    }
}

/// Tag plus `n_samp`/`n_ch` header length in bytes.
pub const HEADER_LEN: usize = 9;

/// Frame serializer with a reusable scratch buffer.
///
/// Sized once at startup for the largest frame the pipeline can emit; writing
/// a frame performs no allocation.
pub struct FrameWriter {
    scratch: Vec<u8>,
}

impl FrameWriter {
    /// # Arguments
    /// * `max_floats` - Largest payload (in values) any frame will carry
    pub fn new(max_floats: usize) -> Self {
        Self {
            scratch: Vec::with_capacity(HEADER_LEN + max_floats * 4),
        }
    }

    /// Serialize one frame from a planar buffer and flush the stream.
    ///
    /// Plane `c` of `planar` occupies `planar[c * stride .. c * stride +
    /// n_samp]`; the payload interleaves planes into row-major order.
    pub fn write_planar<W: Write>(
        &mut self,
        out: &mut W,
        kind: FrameKind,
        n_samp: usize,
        planar: &[f32],
        stride: usize,
    ) -> io::Result<()> {
        let n_ch = kind.channels() as usize;
        debug_assert!(planar.len() >= (n_ch - 1) * stride + n_samp);

        self.scratch.clear();
        self.scratch.push(kind.tag());
        self.scratch
            .extend_from_slice(&(n_samp as u32).to_le_bytes());
        self.scratch
            .extend_from_slice(&(n_ch as u32).to_le_bytes());
        for t in 0..n_samp {
            for c in 0..n_ch {
                self.scratch
                    .extend_from_slice(&planar[c * stride + t].to_le_bytes());
            }
        }

        out.write_all(&self.scratch)?;
        out.flush()
    }
}

/// A parsed frame, row-major payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub kind: FrameKind,
    pub n_samp: u32,
    pub n_ch: u32,
    pub payload: Vec<f32>,
}

impl Frame {
    /// Value at row `t`, channel `c`.
    pub fn value(&self, t: usize, c: usize) -> f32 {
        self.payload[t * self.n_ch as usize + c]
    }
}

/// Parse the next frame from a stream.
///
/// Returns `Ok(None)` on EOF before the tag byte. An unknown tag or a
/// truncated frame is an `InvalidData` error.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Option<Frame>> {
    let mut tag = [0u8; 1];
    match reader.read(&mut tag)? {
        0 => return Ok(None),
        _ => {}
    }
    let kind = FrameKind::from_tag(tag[0]).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown frame tag {}", tag[0]),
        )
    })?;

    let mut hdr = [0u8; 8];
    reader.read_exact(&mut hdr)?;
    let n_samp = u32::from_le_bytes([hdr[0], hdr[1], hdr[2], hdr[3]]);
    let n_ch = u32::from_le_bytes([hdr[4], hdr[5], hdr[6], hdr[7]]);

    let count = (n_samp as usize) * (n_ch as usize);
    let mut payload = vec![0.0f32; count];
    let mut buf = [0u8; 4];
    for value in payload.iter_mut() {
        reader.read_exact(&mut buf)?;
        *value = f32::from_le_bytes(buf);
    }

    Ok(Some(Frame {
        kind,
        n_samp,
        n_ch,
        payload,
    }))
}
