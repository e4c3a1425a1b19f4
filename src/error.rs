//! Error types for page-stream.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for page-stream.
///
/// End of data is never an error: accessors report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    /// Mode specifier is not one of the fopen-style modes.
    #[error("invalid mode: {0:?}")]
    InvalidMode(String),

    /// The underlying file could not be opened.
    #[error("failed to open file: {}", path.display())]
    Open {
        /// File path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Refill from disk failed.
    #[error("read failed at offset {offset}")]
    Read {
        /// Absolute file offset of the failed read.
        offset: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Flush or re-fetch on the write path failed.
    #[error("write failed at offset {offset}")]
    Write {
        /// Absolute file offset of the failed write.
        offset: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A flush wrote fewer bytes than were pending.
    #[error("incomplete flush: wrote {written} of {pending} pending bytes")]
    IncompleteFlush {
        /// Bytes the OS accepted.
        written: usize,
        /// Bytes that were pending before the flush.
        pending: usize,
    },

    /// Repositioning the file failed or resolved to a negative offset.
    #[error("seek failed")]
    Seek(#[source] io::Error),

    /// The channel has already been closed.
    #[error("channel is closed")]
    Closed,

    /// Invalid channel options.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Delimiter value does not fit in the requested code unit.
    #[error("delimiter {value:#x} does not fit in a {width}-byte code unit")]
    DelimiterRange {
        /// Requested delimiter value.
        value: u32,
        /// Code unit width in bytes.
        width: usize,
    },
}

/// Result alias for page-stream operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Open { source, .. }
            | Error::Read { source, .. }
            | Error::Write { source, .. }
            | Error::Seek(source) => source,
            Error::IncompleteFlush { .. } => Self::new(io::ErrorKind::WriteZero, err),
            Error::InvalidMode(_) | Error::Config(_) | Error::DelimiterRange { .. } => {
                Self::new(io::ErrorKind::InvalidInput, err)
            }
            Error::Closed => Self::new(io::ErrorKind::NotConnected, err),
        }
    }
}
