//! Error handling for the voltstream library
//!
//! This module provides a unified error type for all operations in the
//! voltstream library: source I/O, startup configuration, wire-format
//! violations and frame parsing.

use std::fmt;
use std::io;

/// A specialized Result type for voltstream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for voltstream operations
#[derive(Debug)]
pub enum Error {
    /// I/O error (socket, file, output stream)
    Io(io::Error),

    /// Invalid startup configuration (bad argument, decim < 1, < 8 channels)
    Config(String),

    /// ADC source failure (refill error, geometry mismatch, bad preamble)
    Source(String),

    /// Wire-format violation while parsing a frame
    Format(String),

    /// Generic error with custom message
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
            Error::Source(msg) => write!(f, "Source error: {}", msg),
            Error::Format(msg) => write!(f, "Format error: {}", msg),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

// From conversions for common error types

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

// Helper constructors for common error scenarios

impl Error {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a source error with a custom message
    pub fn source_err<S: Into<String>>(msg: S) -> Self {
        Error::Source(msg.into())
    }

    /// Create a wire-format error with a custom message
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create a generic error with a custom message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
