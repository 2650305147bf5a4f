//! Raw Block Reading Module
//!
//! This module reads fixed-size blocks of interleaved raw ADC samples from any
//! byte source (TCP socket, file). The wire contract with the front-end is:
//!
//! - a one-time preamble: `n_ch: u32 LE`, then `n_ch` per-channel scale
//!   factors as `f64 LE` (volts per LSB),
//! - then repeated blocks: `n_samp: u32 LE`, `n_ch: u32 LE`, followed by
//!   `n_samp * n_ch` interleaved `i32 LE` samples in row-major order.
//!
//! The raw block buffer is allocated once and refilled in place; a short read
//! inside a block is an error while EOF exactly at a block boundary is a
//! clean end of stream.

use std::io::{self, Read};
use std::net::TcpStream;
use std::path::Path;

use crate::error::{Error, Result};

/// Upper bound on plausible channel counts in a preamble. Anything larger is
/// treated as a corrupt stream rather than an allocation request.
const MAX_CHANNELS: u32 = 256;

/// One refill's worth of raw interleaved samples.
///
/// Allocated once at startup and refilled in place by the source. Samples are
/// stored row-major: `data[i * n_ch + c]` is sample `i` of channel `c`.
#[derive(Debug, Clone)]
pub struct RawBlock {
    pub n_samp: usize,
    pub n_ch: usize,
    pub data: Vec<i32>,
}

impl RawBlock {
    /// Create a zero-filled block of the given geometry.
    pub fn new(n_samp: usize, n_ch: usize) -> Self {
        Self {
            n_samp,
            n_ch,
            data: vec![0; n_samp * n_ch],
        }
    }

    /// Raw sample `i` of channel `c`.
    #[inline]
    pub fn sample(&self, i: usize, c: usize) -> i32 {
        self.data[i * self.n_ch + c]
    }
}

/// Per-connection metadata read from the preamble.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub channels: usize,
    /// Volts per LSB, one entry per channel, as reported by the front-end.
    pub scales: Vec<f64>,
}

/// Synchronous block reader over any `Read` implementation.
pub struct BlockRead<R: Read> {
    reader: R,
    info: SourceInfo,
    block_samples: usize,
    /// Raw bytes of one block, reused across refills.
    byte_buf: Vec<u8>,
}

impl<R: Read> BlockRead<R> {
    /// Read the preamble and size the refill buffer.
    pub fn new(mut reader: R, block_samples: usize) -> Result<Self> {
        if block_samples == 0 {
            return Err(Error::config("block_samples must be positive"));
        }

        let n_ch = read_u32(&mut reader)?;
        if n_ch == 0 || n_ch > MAX_CHANNELS {
            return Err(Error::source_err(format!(
                "implausible channel count in preamble: {}",
                n_ch
            )));
        }

        let mut scales = Vec::with_capacity(n_ch as usize);
        for _ in 0..n_ch {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            scales.push(f64::from_le_bytes(buf));
        }

        let info = SourceInfo {
            channels: n_ch as usize,
            scales,
        };
        let byte_buf = vec![0u8; block_samples * info.channels * 4];

        Ok(Self {
            reader,
            info,
            block_samples,
            byte_buf,
        })
    }

    /// Preamble metadata (channel count and scale factors).
    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    /// Refill `block` in place with the next block from the stream.
    ///
    /// Returns `Ok(false)` on a clean end of stream (EOF exactly at a block
    /// boundary). Geometry mismatches and short reads are errors.
    pub fn refill(&mut self, block: &mut RawBlock) -> Result<bool> {
        let mut hdr = [0u8; 8];
        match read_exact_or_eof(&mut self.reader, &mut hdr)? {
            ReadOutcome::Eof => return Ok(false),
            ReadOutcome::Full => {}
        }

        let n_samp = u32::from_le_bytes([hdr[0], hdr[1], hdr[2], hdr[3]]) as usize;
        let n_ch = u32::from_le_bytes([hdr[4], hdr[5], hdr[6], hdr[7]]) as usize;
        if n_samp != self.block_samples || n_ch != self.info.channels {
            return Err(Error::source_err(format!(
                "block geometry mismatch: got {}x{}, expected {}x{}",
                n_samp, n_ch, self.block_samples, self.info.channels
            )));
        }
        if block.n_samp != n_samp || block.n_ch != n_ch {
            return Err(Error::source_err(
                "raw block buffer does not match stream geometry",
            ));
        }

        self.reader.read_exact(&mut self.byte_buf)?;
        for (dst, src) in block.data.iter_mut().zip(self.byte_buf.chunks_exact(4)) {
            *dst = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        }
        Ok(true)
    }
}

impl BlockRead<io::BufReader<std::fs::File>> {
    /// Create a new file-based block reader.
    pub fn from_file<P: AsRef<Path>>(path: P, block_samples: usize) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::new(io::BufReader::new(file), block_samples)
    }
}

impl BlockRead<io::BufReader<TcpStream>> {
    /// Create a new TCP-based block reader connected to the front-end.
    pub fn from_tcp(endpoint: &str, block_samples: usize) -> Result<Self> {
        let stream = TcpStream::connect(endpoint)?;
        Self::new(io::BufReader::new(stream), block_samples)
    }
}

enum ReadOutcome {
    Full,
    Eof,
}

/// Fill `buf` completely, distinguishing EOF-before-first-byte from a short
/// read in the middle of the buffer.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<ReadOutcome> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(ReadOutcome::Eof),
            Ok(0) => {
                return Err(Error::source_err(
                    "stream ended in the middle of a block header",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(ReadOutcome::Full)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
