//! Non-blocking command channel.
//!
//! The worker polls its text input for at most one line before each block.
//! Blocking reads would stall the acquisition loop, so a detached reader
//! thread forwards lines into a bounded channel and [`CommandReader::poll`]
//! drains it without blocking. Lines that fail to parse are silently dropped,
//! preserving the best-effort contract; the reader thread dies with the
//! process.

use std::io::BufRead;
use std::thread;

use crossbeam::channel::{bounded, Receiver, TryRecvError};
use tracing::debug;

use crate::params::Command;

/// Pending lines beyond this are back-pressured onto the sender thread.
const CHANNEL_DEPTH: usize = 16;

pub struct CommandReader {
    rx: Receiver<String>,
}

impl CommandReader {
    /// Spawn a reader thread over any buffered line source.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = bounded(CHANNEL_DEPTH);
        thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        Self { rx }
    }

    /// Read commands from the worker's standard input.
    pub fn from_stdin() -> Self {
        Self::spawn(std::io::BufReader::new(std::io::stdin()))
    }

    /// Take at most one pending line and parse it. Returns `None` when no
    /// line is pending or the pending line is malformed (dropped).
    pub fn poll(&self) -> Option<Command> {
        match self.rx.try_recv() {
            Ok(line) => {
                let cmd = Command::parse(&line);
                if cmd.is_none() {
                    debug!("dropping malformed command line: {:?}", line);
                }
                cmd
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
