//! Delimiter scanning over fixed-width code units.
//!
//! A scan has two phases. The skip phase steps over leading units that
//! classify as delimiters. The run phase then extends a record from the first
//! content unit until the next delimiter or end of file. The record's first
//! unit is held at the cursor while the scan peeks ahead, so a refill
//! re-anchors the window around the record and the scan resumes where it
//! stopped.
//!
//! # Examples
//!
//! ```
//! use page_stream::{Channel, Width};
//! # fn example() -> page_stream::Result<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("lines.txt");
//! std::fs::write(&path, b"ab\ncd\n").unwrap();
//!
//! let mut channel = Channel::open(&path, "r")?;
//! assert_eq!(channel.read_line(Width::Byte)?, Some(&b"ab"[..]));
//! assert_eq!(channel.read_line(Width::Byte)?, Some(&b"cd"[..]));
//! assert_eq!(channel.read_line(Width::Byte)?, None);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use core::fmt::{self, Debug, Display, Formatter};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{Error, Result};

/// A fixed-width code unit, decoded in native byte order.
pub trait CodeUnit: Copy + Eq + Debug {
    /// Width in bytes.
    const WIDTH: usize;

    /// Decodes one unit from exactly `WIDTH` bytes.
    fn decode(bytes: &[u8]) -> Self;

    /// Whether the unit terminates a line.
    fn is_terminator(self) -> bool;

    /// Index, in units, of the first unit equal to `needle`.
    fn position(haystack: &[u8], needle: Self) -> Option<usize> {
        haystack
            .chunks_exact(Self::WIDTH)
            .position(|chunk| Self::decode(chunk) == needle)
    }
}

/// Control codes shared by every width: NUL, ENQ, LF, VT, FF and CR.
const fn is_control_terminator(unit: u32) -> bool {
    matches!(unit, 0x00 | 0x05 | 0x0A..=0x0D)
}

impl CodeUnit for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline]
    fn is_terminator(self) -> bool {
        is_control_terminator(u32::from(self))
    }

    fn position(haystack: &[u8], needle: Self) -> Option<usize> {
        memchr::memchr(needle, haystack)
    }
}

impl CodeUnit for u16 {
    const WIDTH: usize = 2;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        Self::from_ne_bytes([bytes[0], bytes[1]])
    }

    #[inline]
    fn is_terminator(self) -> bool {
        // Modified UTF-8 NUL (C0 80) read as a single unit in either byte order
        is_control_terminator(u32::from(self)) || matches!(self, 0xC080 | 0x80C0)
    }
}

impl CodeUnit for u32 {
    const WIDTH: usize = 4;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        Self::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn is_terminator(self) -> bool {
        // Overlong NUL encodings (C0 80, E0 80 80) in either byte order
        is_control_terminator(self)
            || matches!(self, 0xC080 | 0x80C0 | 0x00E0_8080 | 0x0080_80E0)
    }
}

/// Decides which code units separate records.
pub trait Classifier<U: CodeUnit> {
    /// Whether `unit` is a delimiter.
    fn is_delimiter(&self, unit: U) -> bool;

    /// Index, in units, of the first delimiter in `units`.
    fn find(&self, units: &[u8]) -> Option<usize> {
        units
            .chunks_exact(U::WIDTH)
            .position(|chunk| self.is_delimiter(U::decode(chunk)))
    }
}

/// Splits on line terminators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineEnd;

impl<U: CodeUnit> Classifier<U> for LineEnd {
    #[inline]
    fn is_delimiter(&self, unit: U) -> bool {
        unit.is_terminator()
    }
}

/// Splits on one exact unit value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exact<U>(pub U);

impl<U: CodeUnit> Classifier<U> for Exact<U> {
    #[inline]
    fn is_delimiter(&self, unit: U) -> bool {
        unit == self.0
    }

    fn find(&self, units: &[u8]) -> Option<usize> {
        U::position(units, self.0)
    }
}

/// Code unit width for runtime-selected scans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Width {
    /// 1-byte units.
    #[default]
    Byte,
    /// 2-byte units.
    Word,
    /// 4-byte units.
    Dword,
}

impl Width {
    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Dword => 4,
        }
    }

    /// Width from a byte count of 1, 2 or 4.
    pub const fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(Self::Byte),
            2 => Some(Self::Word),
            4 => Some(Self::Dword),
            _ => None,
        }
    }
}

impl Display for Width {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

impl Channel {
    /// Returns the next record delimited by units for which `classifier`
    /// reports a delimiter, skipping any leading delimiters.
    ///
    /// The view spans the record's units, excluding the terminating
    /// delimiter, which is consumed. A record cut short by end of file is
    /// returned as is; trailing bytes that do not fill a whole unit are
    /// ignored. `Ok(None)` means no record remains.
    ///
    /// # Errors
    ///
    /// Returns `Error::Read` if a refill fails or the channel cannot read.
    pub fn scan<U, C>(&mut self, classifier: &C) -> Result<Option<&[u8]>>
    where
        U: CodeUnit,
        C: Classifier<U>,
    {
        let width = U::WIDTH;
        self.prepare_read()?;

        // Skip leading delimiters
        loop {
            if !self.ensure(width)? {
                self.advance(self.available());
                return Ok(None);
            }

            let unit = U::decode(&self.window()[..width]);
            if !classifier.is_delimiter(unit) {
                break;
            }
            self.advance(width);
        }

        // Extend the record, keeping its start at the cursor across refills
        let mut len = width;
        let mut terminated = false;
        while self.ensure(len + width)? {
            let window = self.window();
            let whole = window.len() - window.len() % width;
            if let Some(index) = classifier.find(&window[len..whole]) {
                len += index * width;
                terminated = true;
                break;
            }
            len = whole;
        }

        let consumed = if terminated { len + width } else { len };
        Ok(Some(self.take(len, consumed)))
    }

    /// Returns the next line of `width`-byte units.
    ///
    /// # Errors
    ///
    /// As [`Channel::scan`].
    pub fn read_line(&mut self, width: Width) -> Result<Option<&[u8]>> {
        match width {
            Width::Byte => self.scan::<u8, _>(&LineEnd),
            Width::Word => self.scan::<u16, _>(&LineEnd),
            Width::Dword => self.scan::<u32, _>(&LineEnd),
        }
    }

    /// Returns the next record separated by the exact unit `delimiter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DelimiterRange` if `delimiter` does not fit in `width`,
    /// otherwise as [`Channel::scan`].
    pub fn get_delim(&mut self, delimiter: u32, width: Width) -> Result<Option<&[u8]>> {
        let out_of_range = || Error::DelimiterRange {
            value: delimiter,
            width: width.bytes(),
        };

        match width {
            Width::Byte => {
                let unit = u8::try_from(delimiter).map_err(|_| out_of_range())?;
                self.scan::<u8, _>(&Exact(unit))
            }
            Width::Word => {
                let unit = u16::try_from(delimiter).map_err(|_| out_of_range())?;
                self.scan::<u16, _>(&Exact(unit))
            }
            Width::Dword => self.scan::<u32, _>(&Exact(delimiter)),
        }
    }
}
