//! Write trait abstractions for stdout and stderr.

use anyhow::Result;
use std::fmt::{self, Debug, Formatter};
use std::io::{self, ErrorKind::BrokenPipe, Write};

/// `Writer` dynamic dispatches the `Write` trait.
pub(crate) type Writer = Box<dyn Write>;

/// `Output` writes to a stream like stdout or stderr.
pub(crate) struct Output {
    writer: Writer,
}

impl Debug for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("writer", &"<dyn Write>")
            .finish()
    }
}

impl Output {
    /// Creates an `Output` that writes to stdout.
    pub(crate) fn stdout() -> Self {
        Self {
            writer: Box::new(io::BufWriter::new(io::stdout().lock())),
        }
    }

    /// Creates an `Output` that writes to stderr.
    pub(crate) fn stderr() -> Self {
        Self {
            writer: Box::new(io::stderr().lock()),
        }
    }

    /// Writes bytes to the writer, handling `BrokenPipe` errors gracefully.
    pub(crate) fn write_chunk(&mut self, bytes: &[u8]) -> Result<()> {
        Self::handle_broken_pipe(self.writer.write_all(bytes))
    }

    /// Flushes the writer, ensuring all output is written.
    pub(crate) fn flush(&mut self) -> Result<()> {
        Self::handle_broken_pipe(self.writer.flush())
    }

    /// Processes the result of a write, handling `BrokenPipe` errors gracefully.
    fn handle_broken_pipe(result: io::Result<()>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) => match err.kind() {
                BrokenPipe => Ok(()),
                _ => Err(err.into()),
            },
        }
    }
}
