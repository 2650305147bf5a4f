//! Serial trace sink.
//!
//! Duplicate textual trace of the final corrected output, one line per
//! decimated row, written to a serial port at 115200 8N1 when one is
//! available. The sink is a capability: call sites hold a [`TraceSink`] and
//! never care whether a port is behind it. Open failures and write errors are
//! non-fatal; a failed open logs a warning and yields `Absent`, a failed
//! write is silently suppressed for that row.

use crate::QUADS;

#[cfg(feature = "serial")]
use std::fmt::Write as _;
#[cfg(feature = "serial")]
use std::time::Duration;
#[cfg(feature = "serial")]
use tracing::warn;

/// Trace output capability.
pub enum TraceSink {
    /// An open serial port plus a reusable line buffer.
    #[cfg(feature = "serial")]
    Present(SerialTrace),
    /// No port available; every write is a no-op.
    Absent,
}

#[cfg(feature = "serial")]
pub struct SerialTrace {
    port: Box<dyn serialport::SerialPort>,
    line: String,
}

impl TraceSink {
    pub fn absent() -> Self {
        TraceSink::Absent
    }

    /// Try to open a serial port; failure is tolerated and yields `Absent`.
    #[cfg(feature = "serial")]
    pub fn open(path: &str, baud: u32) -> Self {
        match serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Duration::from_millis(100))
            .open()
        {
            Ok(port) => TraceSink::Present(SerialTrace {
                port,
                line: String::with_capacity(96),
            }),
            Err(e) => {
                warn!("trace port {} unavailable, trace disabled: {}", path, e);
                TraceSink::Absent
            }
        }
    }

    /// Built without serial support: the trace is compiled out.
    #[cfg(not(feature = "serial"))]
    pub fn open(_path: &str, _baud: u32) -> Self {
        TraceSink::Absent
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, TraceSink::Absent)
    }

    /// Write one `YT[row] = yt0, yt1, yt2, yt3` line, CR+LF terminated.
    /// Best-effort: errors are swallowed.
    pub fn write_row(&mut self, row: u64, yt: &[f32; QUADS]) {
        match self {
            #[cfg(feature = "serial")]
            TraceSink::Present(trace) => {
                trace.line.clear();
                let _ = write!(
                    trace.line,
                    "YT[{}] = {}, {}, {}, {}\r\n",
                    row, yt[0], yt[1], yt[2], yt[3]
                );
                let _ = std::io::Write::write_all(&mut trace.port, trace.line.as_bytes());
            }
            TraceSink::Absent => {
                let _ = row;
                let _ = yt;
            }
        }
    }
}
