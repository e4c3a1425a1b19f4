//! Translation of fopen-style mode strings into open options and capabilities.

use core::fmt::{self, Display, Formatter};
use core::ops::BitOr;
use serde::{Serialize, Serializer};
use std::fs::OpenOptions;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Capability bitmask derived from a mode string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const READ: Self = Self(1);
    pub const WRITE: Self = Self(1 << 1);
    pub const APPEND: Self = Self(1 << 2);
    pub const CREATE: Self = Self(1 << 3);
    pub const TRUNCATE: Self = Self(1 << 4);

    /// Whether every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Display for Capabilities {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::READ, "read"),
            (Self::WRITE, "write"),
            (Self::APPEND, "append"),
            (Self::CREATE, "create"),
            (Self::TRUNCATE, "truncate"),
        ];

        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        write!(f, "{}", set.join("|"))
    }
}

/// A parsed access mode.
///
/// # Examples
///
/// ```
/// use page_stream::{Capabilities, Mode};
///
/// let mode: Mode = "a+".parse().unwrap();
/// assert!(mode.can_read());
/// assert!(mode.capabilities().contains(Capabilities::APPEND));
/// assert_eq!(mode.to_string(), "a+");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mode {
    capabilities: Capabilities,
}

impl Mode {
    /// Permission bits for newly created files.
    pub const PERMISSIONS: u32 = 0o644;

    /// Parse a mode specifier: `r`, `w` or `a`, optionally followed by `+`,
    /// with an ignored `b` accepted anywhere after the first character.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMode` for anything else.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidMode(text.to_string());
        let mut bytes = text.bytes();

        let mut capabilities = match bytes.next() {
            Some(b'r') => Capabilities::READ,
            Some(b'w') => Capabilities::WRITE | Capabilities::CREATE | Capabilities::TRUNCATE,
            Some(b'a') => Capabilities::WRITE | Capabilities::CREATE | Capabilities::APPEND,
            _ => return Err(invalid()),
        };

        let mut plus = false;
        let mut binary = false;
        for byte in bytes {
            match byte {
                b'+' if !plus => plus = true,
                b'b' if !binary => binary = true,
                _ => return Err(invalid()),
            }
        }

        if plus {
            capabilities = capabilities | Capabilities::READ | Capabilities::WRITE;
        }

        Ok(Self { capabilities })
    }

    /// The capability bitmask.
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub const fn can_read(&self) -> bool {
        self.capabilities.contains(Capabilities::READ)
    }

    pub const fn can_write(&self) -> bool {
        self.capabilities.contains(Capabilities::WRITE)
    }

    pub const fn is_append(&self) -> bool {
        self.capabilities.contains(Capabilities::APPEND)
    }

    /// Read capability without write capability.
    pub const fn is_read_only(&self) -> bool {
        self.can_read() && !self.can_write()
    }

    /// OS open options for this mode.
    ///
    /// Write-capable modes also ask for read access, which the write path
    /// uses to restore a page head when it re-anchors its window.
    pub fn open_options(&self) -> OpenOptions {
        self.os_options(true)
    }

    /// OS open options without read access, for write-only modes on files
    /// the process may write but not read.
    pub fn write_only_options(&self) -> OpenOptions {
        self.os_options(self.can_read())
    }

    fn os_options(&self, read: bool) -> OpenOptions {
        let caps = self.capabilities;
        let mut options = OpenOptions::new();

        options
            .read(read)
            .write(caps.contains(Capabilities::WRITE) && !caps.contains(Capabilities::APPEND))
            .append(caps.contains(Capabilities::APPEND))
            .create(caps.contains(Capabilities::CREATE))
            .truncate(caps.contains(Capabilities::TRUNCATE));

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(Self::PERMISSIONS);
        }

        options
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let base = if self.is_append() {
            "a"
        } else if self.capabilities.contains(Capabilities::TRUNCATE) {
            "w"
        } else {
            "r"
        };
        let plus = if self.can_read() && self.can_write() {
            "+"
        } else {
            ""
        };

        write!(f, "{base}{plus}")
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
