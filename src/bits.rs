//! Bit-level access packed into 64-bit words.
//!
//! Bits are packed most-significant first into a `u64` that moves through
//! the underlying [`Channel`] one whole word at a time, stored big-endian so
//! that bit order on disk follows byte order. A stream that does not end on a
//! word boundary is padded with zero bits when closed; the padding is not
//! distinguishable from data, so callers track their own bit count.
//!
//! A bit channel is either written or read, not both.
//!
//! # Examples
//!
//! ```
//! use page_stream::BitChannel;
//! # fn example() -> page_stream::Result<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("bits.bin");
//!
//! let mut bits = BitChannel::open(&path, "w")?;
//! for bit in [true, false, true, true] {
//!     bits.write_bit(bit)?;
//! }
//! bits.close()?;
//!
//! let mut bits = BitChannel::open(&path, "r")?;
//! assert_eq!(bits.read_bits(4)?, Some(0b1011));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::path::Path;

use crate::channel::Channel;
use crate::error::Result;
use crate::options::Options;

/// Size of one packed word, in bytes.
const WORD_BYTES: usize = size_of::<u64>();

/// Mask of the first bit in a word.
const TOP: u64 = 1 << 63;

/// A channel viewed as a stream of bits.
#[derive(Debug)]
pub struct BitChannel {
    channel: Channel,
    /// Single set bit marking the next position, or zero after a failed write.
    mask: u64,
    /// Word being assembled or drained.
    word: u64,
    writing: bool,
}

impl BitChannel {
    /// Opens a bit channel with default options.
    ///
    /// # Errors
    ///
    /// As [`Channel::open`].
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self> {
        Channel::open(path, mode).map(Self::new)
    }

    /// Opens a bit channel with explicit buffer geometry.
    ///
    /// # Errors
    ///
    /// As [`Channel::with_options`].
    pub fn with_options<P: AsRef<Path>>(path: P, mode: &str, options: Options) -> Result<Self> {
        Channel::with_options(path, mode, options).map(Self::new)
    }

    /// Wraps an open channel, starting at the channel's cursor.
    pub const fn new(channel: Channel) -> Self {
        Self {
            channel,
            mask: TOP,
            word: 0,
            writing: false,
        }
    }

    /// Appends one bit. Returns `true` when the bit completed a word and the
    /// word was handed to the channel.
    ///
    /// # Errors
    ///
    /// Propagates channel write failures. The completed word is kept and
    /// written again by the next call.
    pub fn write_bit(&mut self, bit: bool) -> Result<bool> {
        if self.mask == 0 {
            self.write_word()?;
        }

        self.writing = true;
        if bit {
            self.word |= self.mask;
        }
        self.mask >>= 1;

        if self.mask == 0 {
            self.write_word()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Appends the low `count` bits of `value`, most significant first.
    /// Returns the number of words completed.
    ///
    /// # Errors
    ///
    /// As [`BitChannel::write_bit`].
    pub fn write_bits(&mut self, value: u64, count: u32) -> Result<usize> {
        let count = count.min(u64::BITS);
        let mut words = 0;

        for shift in (0..count).rev() {
            if self.write_bit((value >> shift) & 1 == 1)? {
                words += 1;
            }
        }

        Ok(words)
    }

    /// Reads the next bit, or `None` once the channel is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates channel read failures.
    pub fn read_bit(&mut self) -> Result<Option<bool>> {
        if self.mask == TOP {
            let Some(bytes) = self.channel.read(WORD_BYTES)? else {
                return Ok(None);
            };

            // A short trailing word reads as zero padding
            let mut word = [0; WORD_BYTES];
            word[..bytes.len()].copy_from_slice(bytes);
            self.word = u64::from_be_bytes(word);
        }

        let bit = self.word & self.mask != 0;
        self.mask >>= 1;
        if self.mask == 0 {
            self.mask = TOP;
        }

        Ok(Some(bit))
    }

    /// Reads `count` bits, at most 64, into the low bits of a `u64`, most
    /// significant first. Returns `None` if the channel runs out first.
    ///
    /// # Errors
    ///
    /// As [`BitChannel::read_bit`].
    pub fn read_bits(&mut self, count: u32) -> Result<Option<u64>> {
        let mut value = 0;

        for _ in 0..count.min(u64::BITS) {
            let Some(bit) = self.read_bit()? else {
                return Ok(None);
            };
            value = (value << 1) | u64::from(bit);
        }

        Ok(Some(value))
    }

    /// Writes any partial word, zero-padded, then closes the channel.
    ///
    /// The channel is released even when the final word cannot be written.
    ///
    /// # Errors
    ///
    /// Returns the first write or flush failure.
    pub fn close(&mut self) -> Result<()> {
        let padded = if self.writing && self.mask != TOP {
            self.write_word()
        } else {
            Ok(())
        };
        self.writing = false;

        let closed = self.channel.close();
        padded.and(closed)
    }

    /// The underlying byte channel.
    pub const fn channel(&self) -> &Channel {
        &self.channel
    }

    fn write_word(&mut self) -> Result<()> {
        self.mask = 0;
        self.channel.write_all(&self.word.to_be_bytes())?;
        self.word = 0;
        self.mask = TOP;
        Ok(())
    }
}

impl Drop for BitChannel {
    fn drop(&mut self) {
        // Errors cannot be reported from drop; call `close` to observe them
        self.close().ok();
    }
}
