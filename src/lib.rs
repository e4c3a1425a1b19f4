//! Page-aligned windowed buffering over a single file.
//!
//! `page-stream` replaces implicit stream buffering with an explicit sliding
//! window over a file. A [`Channel`] keeps one heap buffer mirroring a
//! page-aligned span of the file and hands out zero-copy views into it:
//! reads borrow bytes already in the window, writes borrow the region the
//! caller fills. Refills, flushes and re-anchoring happen only when a request
//! does not fit the current window.
//!
//! Two layers sit on top of the channel:
//!
//! * [`Channel::read_line`] and [`Channel::get_delim`] scan for records of
//!   1, 2 or 4-byte code units, refilling mid-scan without losing position.
//! * [`BitChannel`] packs single bits, most significant first, into 64-bit
//!   words.
//!
//! A channel is single-threaded and owns exactly one file handle. Views are
//! borrows of the channel, valid until its next call.
//!
//! ## Module structure
//!
//! - `bits.rs`: Bit-level access packed into 64-bit words
//! - `channel.rs`: The windowed channel and its refill, flush and seek logic
//! - `error.rs`: Typed errors
//! - `exit_code.rs`: Exit code definitions for the command-line tool
//! - `mode.rs`: fopen-style mode translation
//! - `options.rs`: Buffer geometry configuration
//! - `scan.rs`: Delimiter scanning over fixed-width code units
//! - `stats.rs`: I/O counters
//!
//! # Examples
//!
//! ```
//! use page_stream::{Channel, Options, Width};
//! # fn example() -> page_stream::Result<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("records.txt");
//!
//! let mut channel = Channel::open(&path, "w+")?;
//! channel.write_all(b"alpha\nbeta\n")?;
//! channel.rewind()?;
//!
//! let mut lines = Vec::new();
//! while let Some(line) = channel.read_line(Width::Byte)? {
//!     lines.push(line.to_vec());
//! }
//! assert_eq!(lines, [b"alpha".to_vec(), b"beta".to_vec()]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod bits;
pub mod channel;
pub mod error;
pub mod exit_code;
pub mod mode;
pub mod options;
pub mod scan;
pub mod stats;

pub use bits::BitChannel;
pub use channel::{Channel, Direction};
pub use error::{Error, Result};
pub use exit_code::ExitCode;
pub use mode::{Capabilities, Mode};
pub use options::Options;
pub use scan::{Classifier, CodeUnit, Exact, LineEnd, Width};
pub use stats::Stats;
