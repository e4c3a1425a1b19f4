//! A page-aligned sliding window over a single file.
//!
//! A `Channel` owns one file handle and one heap buffer. The buffer mirrors a
//! window of the file whose position is tracked by two absolute offsets:
//!
//! - `anchor`: in the read direction, one past the last byte fetched into the
//!   buffer; in the write direction, the offset up to which data has been
//!   flushed.
//! - `cursor`: the caller's logical position.
//!
//! Reading keeps `anchor - capacity <= cursor <= anchor`; writing keeps
//! `anchor <= cursor <= anchor + capacity`. When a request does not fit the
//! window, the window is refilled or flushed, and re-anchored to a page
//! boundary when the cursor is not sitting on the edge of the current window.
//!
//! Accessors hand out borrows of the internal buffer, so a view is valid only
//! until the next call on the channel.
//!
//! # Examples
//!
//! ```
//! use page_stream::Channel;
//! # fn example() -> page_stream::Result<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("data.bin");
//!
//! let mut channel = Channel::open(&path, "w")?;
//! channel.write(4)?.copy_from_slice(&[1, 2, 3, 4]);
//! channel.close()?;
//!
//! let mut channel = Channel::open(&path, "r")?;
//! assert_eq!(channel.read(4)?, Some(&[1, 2, 3, 4][..]));
//! assert_eq!(channel.read(1)?, None);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use core::fmt::{self, Debug, Display, Formatter};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::mode::Mode;
use crate::options::Options;
use crate::stats::Stats;

/// Which way the window currently faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The buffer holds `[anchor - filled, anchor)` fetched from disk.
    Read,
    /// The buffer holds `[anchor, cursor)` waiting to be flushed.
    Write,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// A buffered file channel with zero-copy accessors.
pub struct Channel {
    file: Option<File>,
    path: PathBuf,
    mode: Mode,
    options: Options,
    file_size: u64,
    anchor: u64,
    cursor: u64,
    buffer: Vec<u8>,
    /// Valid bytes at the front of the buffer in the read direction.
    filled: usize,
    direction: Direction,
    /// Mirror of the OS file offset, `None` when unknown.
    position: Option<u64>,
    /// Whether the descriptor was opened with read access.
    readable: bool,
    stats: Stats,
}

impl Debug for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("direction", &self.direction)
            .field("file_size", &self.file_size)
            .field("anchor", &self.anchor)
            .field("cursor", &self.cursor)
            .field("capacity", &self.buffer.len())
            .field("closed", &self.file.is_none())
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Opens `path` with an fopen-style mode and default options.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMode` for an unrecognized mode and `Error::Open`
    /// if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self> {
        Self::with_options(path, mode, Options::default())
    }

    /// Opens `path` with an fopen-style mode and explicit buffer geometry.
    ///
    /// # Errors
    ///
    /// As [`Channel::open`], plus `Error::Config` for invalid options.
    pub fn with_options<P: AsRef<Path>>(path: P, mode: &str, options: Options) -> Result<Self> {
        let mode = Mode::parse(mode)?;
        Self::open_mode(path.as_ref(), mode, options)
    }

    /// Opens `path` with an already parsed mode.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for invalid options and `Error::Open` if the
    /// file cannot be opened or its size cannot be read.
    pub fn open_mode(path: &Path, mode: Mode, options: Options) -> Result<Self> {
        options.validate()?;

        let open_failed = |source| Error::Open {
            path: path.to_path_buf(),
            source,
        };
        let (file, readable) = match mode.open_options().open(path) {
            Ok(file) => (file, true),
            // Write-only modes still open files the process may not read
            Err(err) if err.kind() == ErrorKind::PermissionDenied && !mode.can_read() => {
                let file = mode.write_only_options().open(path).map_err(open_failed)?;
                (file, false)
            }
            Err(err) => return Err(open_failed(err)),
        };
        let file_size = file.metadata().map_err(open_failed)?.len();

        // Never allocate past the end of a file that will only be read
        let mut capacity = options.alloc_size;
        if mode.is_read_only() {
            capacity = usize::try_from(file_size).map_or(capacity, |size| size.min(capacity));
        }

        let direction = if mode.can_read() {
            Direction::Read
        } else {
            Direction::Write
        };

        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            mode,
            options,
            file_size,
            anchor: 0,
            cursor: 0,
            buffer: vec![0; capacity],
            filled: 0,
            direction,
            position: Some(0),
            readable,
            stats: Stats::default(),
        })
    }

    /// Flushes pending writes, then releases the file handle and the buffer.
    ///
    /// Resources are released even when the flush fails. Closing an already
    /// closed channel does nothing.
    ///
    /// # Errors
    ///
    /// Returns the flush failure, if any.
    pub fn close(&mut self) -> Result<()> {
        if self.file.is_none() {
            return Ok(());
        }

        let flushed = self.flush().map(|_| ());

        self.file = None;
        self.buffer = Vec::new();
        self.filled = 0;
        self.position = None;

        flushed
    }

    /// Writes the pending bytes `[anchor, cursor)` to disk.
    ///
    /// Returns the number of bytes written. Channels without write capability,
    /// or facing the read direction, have nothing to flush.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if the OS write fails, and
    /// `Error::IncompleteFlush` if it accepts only part of the pending bytes;
    /// the anchor then advances by the partial amount and the remainder stays
    /// pending.
    pub fn flush(&mut self) -> Result<usize> {
        if !self.mode.can_write() || self.direction != Direction::Write {
            return Ok(0);
        }

        let pending = self.write_index();
        if pending == 0 {
            return Ok(0);
        }

        self.reposition(self.anchor)?;
        let file = self.file.as_mut().ok_or(Error::Closed)?;
        let written = loop {
            match file.write(&self.buffer[..pending]) {
                Ok(written) => break written,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    self.position = None;
                    return Err(Error::Write {
                        offset: self.anchor,
                        source,
                    });
                }
            }
        };

        self.anchor += written as u64;
        self.position = Some(self.anchor);
        self.file_size = self.file_size.max(self.anchor);
        if written > 0 {
            self.stats.flushes += 1;
            self.stats.bytes_flushed += written as u64;
        }

        if written < pending {
            self.buffer.copy_within(written..pending, 0);
            return Err(Error::IncompleteFlush { written, pending });
        }

        Ok(written)
    }

    /// Returns a view of up to `desired` bytes at the cursor and advances the
    /// cursor past them.
    ///
    /// The view is shorter than `desired` only at end of file. `Ok(None)`
    /// means the file is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Read` if a refill fails or the channel cannot read, and
    /// `Error::Closed` after close.
    pub fn read(&mut self, desired: usize) -> Result<Option<&[u8]>> {
        self.prepare_read()?;
        self.ensure(desired)?;

        let actual = desired.min(self.available());
        if actual == 0 && desired > 0 {
            return Ok(None);
        }

        let start = self.read_index();
        self.cursor += actual as u64;
        Ok(Some(&self.buffer[start..start + actual]))
    }

    /// Reserves `size` bytes at the cursor, advances the cursor past them and
    /// returns the region for the caller to fill.
    ///
    /// The region's prior contents are unspecified; every byte of it is
    /// written to disk on the next flush.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if flushing or re-fetching fails or the channel
    /// cannot write, and `Error::Closed` after close.
    pub fn write(&mut self, size: usize) -> Result<&mut [u8]> {
        self.prepare_write()?;

        if self.cursor.saturating_add(size as u64) > self.anchor + self.buffer.len() as u64 {
            self.sync_write(size)?;
        }

        let start = self.write_index();
        self.cursor += size as u64;
        Ok(&mut self.buffer[start..start + size])
    }

    /// Copies `bytes` into the channel at the cursor.
    ///
    /// # Errors
    ///
    /// As [`Channel::write`].
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Moves the cursor and returns the new absolute offset.
    ///
    /// Pending writes are flushed first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Seek` if the OS rejects the seek or the target would be
    /// negative, and `Error::Read` if reloading the window fails.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        if self.file.is_none() {
            return Err(Error::Closed);
        }

        self.flush()?;
        let target = self.resolve(pos)?;
        self.stats.seeks += 1;

        if target == 0 {
            self.anchor = 0;
            self.cursor = 0;
            self.filled = 0;
            return Ok(0);
        }

        match self.direction {
            Direction::Read => self.seek_read(target)?,
            Direction::Write => self.seek_write(target),
        }

        Ok(target)
    }

    /// Moves the cursor back to the start of the file.
    ///
    /// # Errors
    ///
    /// As [`Channel::seek`].
    pub fn rewind(&mut self) -> Result<()> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// The absolute offset of the cursor.
    pub const fn tell(&self) -> u64 {
        self.cursor
    }

    /// The window anchor.
    pub const fn anchor(&self) -> u64 {
        self.anchor
    }

    /// The current buffer length.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The cached file size.
    pub const fn file_size(&self) -> u64 {
        self.file_size
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub const fn options(&self) -> Options {
        self.options
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn stats(&self) -> Stats {
        self.stats
    }

    pub const fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Bytes between the cursor and the far edge of the read window.
    pub(crate) fn available(&self) -> usize {
        usize::try_from(self.anchor.saturating_sub(self.cursor)).unwrap_or(usize::MAX)
    }

    /// The unread part of the read window.
    pub(crate) fn window(&self) -> &[u8] {
        &self.buffer[self.read_index()..self.filled]
    }

    /// Advances the cursor within the read window.
    pub(crate) fn advance(&mut self, amount: usize) {
        self.cursor += amount.min(self.available()) as u64;
    }

    /// Returns `len` bytes at the cursor and advances the cursor by `consumed`.
    pub(crate) fn take(&mut self, len: usize, consumed: usize) -> &[u8] {
        let start = self.read_index();
        self.advance(consumed);
        &self.buffer[start..start + len]
    }

    /// Makes sure at least `want` bytes past the cursor are in the window,
    /// refilling if needed. Returns `false` if end of file comes first.
    pub(crate) fn ensure(&mut self, want: usize) -> Result<bool> {
        if self.available() >= want {
            return Ok(true);
        }

        self.sync_read(want)?;
        Ok(self.available() >= want)
    }

    /// Switches to the read direction, flushing pending writes.
    pub(crate) fn prepare_read(&mut self) -> Result<()> {
        if self.file.is_none() {
            return Err(Error::Closed);
        }

        if !self.mode.can_read() {
            return Err(Error::Read {
                offset: self.cursor,
                source: io::Error::new(ErrorKind::PermissionDenied, "not opened for reading"),
            });
        }

        if self.direction == Direction::Write {
            self.flush()?;
            self.direction = Direction::Read;
            self.anchor = self.cursor;
            self.filled = 0;
        }

        Ok(())
    }

    fn prepare_write(&mut self) -> Result<()> {
        if self.file.is_none() {
            return Err(Error::Closed);
        }

        if !self.mode.can_write() {
            return Err(Error::Write {
                offset: self.cursor,
                source: io::Error::new(ErrorKind::PermissionDenied, "not opened for writing"),
            });
        }

        if self.direction == Direction::Read {
            self.direction = Direction::Write;
            self.anchor = self.cursor;
            self.filled = 0;
        }

        // Appends always land at end of file
        if self.mode.is_append() && self.cursor == self.anchor {
            self.anchor = self.file_size;
            self.cursor = self.file_size;
        }

        Ok(())
    }

    /// Buffer index of the cursor in the read direction.
    fn read_index(&self) -> usize {
        self.filled - self.available()
    }

    /// Buffer index of the cursor in the write direction.
    fn write_index(&self) -> usize {
        usize::try_from(self.cursor - self.anchor).unwrap_or(usize::MAX)
    }

    /// Refills the read window so that it covers at least `size` bytes past
    /// the cursor where the file allows. Returns the number of bytes fetched.
    fn sync_read(&mut self, size: usize) -> Result<usize> {
        if self.anchor >= self.file_size {
            return Ok(0);
        }

        // Never size the window past end of file
        let remaining = self.file_size.saturating_sub(self.cursor);
        let size = usize::try_from(remaining).map_or(size, |remaining| size.min(remaining));

        // Fully consumed window: fetch the next one into the same buffer
        let head = if self.cursor == self.anchor && size <= self.buffer.len() {
            self.anchor
        } else {
            self.resize(size)
        };

        self.load_window(head)
    }

    /// Flushes, then makes room for `size` bytes at the cursor.
    fn sync_write(&mut self, size: usize) -> Result<()> {
        let capacity = self.buffer.len();
        let at_edge = self.cursor == self.anchor + capacity as u64;

        self.flush()?;

        // Without read access the page head cannot be restored from disk,
        // so the window starts at the cursor
        if self.mode.is_append() || !self.readable {
            if size > capacity {
                self.reallocate(self.options.page_ceil(size as u64));
            }
            return Ok(());
        }

        if at_edge && size <= capacity {
            return Ok(());
        }

        let head = self.resize(size);
        self.refetch(head)?;
        self.anchor = head;
        Ok(())
    }

    /// Grows the buffer to cover the pages spanned by `[cursor, cursor + size)`
    /// and returns the page-aligned start of that span. Contents are discarded.
    fn resize(&mut self, size: usize) -> u64 {
        let head = self.options.page_floor(self.cursor);
        let offset = self.cursor - head;
        let span = self.options.page_ceil(offset.saturating_add(size as u64));

        if span > self.buffer.len() as u64 {
            self.reallocate(span);
        }

        head
    }

    fn reallocate(&mut self, span: u64) {
        let span = usize::try_from(span).unwrap_or(usize::MAX);
        self.buffer = vec![0; span];
        self.filled = 0;
        self.stats.reallocations += 1;
    }

    /// Fetches a read window starting at `head`. On failure the window is
    /// left empty at the cursor.
    fn load_window(&mut self, head: u64) -> Result<usize> {
        match self.fetch(head) {
            Ok(fetched) => {
                self.filled = fetched;
                self.anchor = head + fetched as u64;
                if self.anchor < self.cursor {
                    // File shrank underneath us
                    self.filled = 0;
                    self.anchor = self.cursor;
                }
                Ok(fetched)
            }
            Err(err) => {
                self.filled = 0;
                self.anchor = self.cursor;
                Err(err)
            }
        }
    }

    /// Loads the on-disk bytes at `head` into a write window so that
    /// re-flushing the span before the cursor rewrites them unchanged.
    /// Bytes past end of file are zeroed, matching the hole the OS leaves.
    fn refetch(&mut self, head: u64) -> Result<()> {
        let fetched = self.fetch(head)?;
        self.buffer[fetched..].fill(0);
        Ok(())
    }

    /// Reads up to one buffer of bytes at `at`, clamped to the file size.
    fn fetch(&mut self, at: u64) -> Result<usize> {
        let remaining = self.file_size.saturating_sub(at);
        let want = usize::try_from(remaining).map_or(self.buffer.len(), |remaining| {
            remaining.min(self.buffer.len())
        });
        if want == 0 {
            return Ok(0);
        }

        self.reposition(at)?;
        let file = self.file.as_mut().ok_or(Error::Closed)?;

        let mut fetched = 0;
        while fetched < want {
            match file.read(&mut self.buffer[fetched..want]) {
                Ok(0) => break,
                Ok(count) => fetched += count,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    self.position = None;
                    return Err(Error::Read {
                        offset: at + fetched as u64,
                        source,
                    });
                }
            }
        }

        self.position = Some(at + fetched as u64);
        self.stats.refills += 1;
        self.stats.bytes_fetched += fetched as u64;
        Ok(fetched)
    }

    /// Moves the OS file offset to `at` unless it is already there.
    fn reposition(&mut self, at: u64) -> Result<()> {
        if self.position == Some(at) {
            return Ok(());
        }

        let file = self.file.as_mut().ok_or(Error::Closed)?;
        file.seek(SeekFrom::Start(at)).map_err(Error::Seek)?;
        self.position = Some(at);
        Ok(())
    }

    /// Resolves a seek request to an absolute offset.
    fn resolve(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.cursor.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let file = self.file.as_mut().ok_or(Error::Closed)?;
                let end = file.seek(SeekFrom::End(0)).map_err(Error::Seek)?;
                self.position = Some(end);
                self.file_size = end;
                end.checked_add_signed(delta)
            }
        };

        target.ok_or_else(|| {
            Error::Seek(io::Error::new(
                ErrorKind::InvalidInput,
                "seek to a negative or overflowing position",
            ))
        })
    }

    fn seek_read(&mut self, target: u64) -> Result<()> {
        let start = self.anchor - self.filled as u64;

        if target >= self.file_size {
            // Logical end of file
            self.anchor = target;
            self.cursor = target;
            self.filled = 0;
        } else if (start..=self.anchor).contains(&target) {
            self.cursor = target;
        } else if self.options.is_page_aligned(target) {
            self.anchor = target;
            self.cursor = target;
            self.filled = 0;
        } else {
            let head = self.options.page_floor(target);
            self.cursor = target;
            self.load_window(head)?;
        }

        Ok(())
    }

    /// Starts an empty write window at `target`. Nothing before the target
    /// becomes pending, so a seek alone never changes the file.
    const fn seek_write(&mut self, target: u64) {
        self.anchor = target;
        self.cursor = target;
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        // Errors cannot be reported from drop; call `close` to observe them
        self.close().ok();
    }
}

impl Read for Channel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Self::read(self, buf.len())? {
            Some(bytes) => {
                buf[..bytes.len()].copy_from_slice(bytes);
                Ok(bytes.len())
            }
            None => Ok(0),
        }
    }
}

impl BufRead for Channel {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.prepare_read()?;
        if self.available() == 0 {
            self.sync_read(1)?;
        }

        Ok(self.window())
    }

    fn consume(&mut self, amt: usize) {
        self.advance(amt);
    }
}

impl Write for Channel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Self::flush(self).map(|_| ()).map_err(io::Error::from)
    }
}

impl Seek for Channel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Self::seek(self, pos).map_err(io::Error::from)
    }
}
