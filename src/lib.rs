#![doc = include_str!("../readme.md")]

use std::io::BufReader;
use std::net::TcpStream;
use std::path::Path;

pub mod blockread;
pub mod command;
pub mod convert;
pub mod dsp;
pub mod error;
pub mod frame;
pub mod params;
pub mod pipeline;
pub mod synth;
pub mod trace;

pub use blockread::{BlockRead, RawBlock, SourceInfo};
pub use error::{Error, Result};

/// Number of voltage channels carried through the pipeline.
pub const CHANNELS: usize = 8;

/// Number of sensor/standard lanes derived from the channels.
pub const QUADS: usize = 4;

/**
 * Synchronous ADC block source
 */
pub enum AdcSource {
    /// File-based raw block source
    File(BlockRead<BufReader<std::fs::File>>),
    /// TCP-based raw block source (the networked front-end)
    Tcp(BlockRead<BufReader<TcpStream>>),
    /// Built-in deterministic signal generator
    Synthetic(synth::SyntheticAdc),
}

impl AdcSource {
    /// Create a new file-based block source
    pub fn from_file<P: AsRef<Path>>(path: P, block_samples: usize) -> Result<Self> {
        let source = BlockRead::from_file(path, block_samples)?;
        Ok(AdcSource::File(source))
    }

    /// Create a new TCP-based block source connected to the front-end
    pub fn from_tcp(endpoint: &str, block_samples: usize) -> Result<Self> {
        let source = BlockRead::from_tcp(endpoint, block_samples)?;
        Ok(AdcSource::Tcp(source))
    }

    /// Create a synthetic source at the given sampling frequency
    pub fn synthetic(fs: f64) -> Self {
        AdcSource::Synthetic(synth::SyntheticAdc::new(fs, CHANNELS))
    }

    /// Channel count and per-channel scale factors of this source
    pub fn info(&self) -> &SourceInfo {
        match self {
            AdcSource::File(source) => source.info(),
            AdcSource::Tcp(source) => source.info(),
            AdcSource::Synthetic(source) => source.info(),
        }
    }

    /// Refill `block` in place with the next window of samples.
    ///
    /// Returns `Ok(false)` on a clean end of stream; any other failure is an
    /// error the worker treats as fatal.
    pub fn refill(&mut self, block: &mut RawBlock) -> Result<bool> {
        match self {
            AdcSource::File(source) => source.refill(block),
            AdcSource::Tcp(source) => source.refill(block),
            AdcSource::Synthetic(source) => {
                source.refill(block);
                Ok(true)
            }
        }
    }
}
