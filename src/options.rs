//! Constructor-time configuration for channel buffering.

use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Buffer geometry used by a channel.
///
/// Windows are always aligned to `page_size`, and a freshly opened channel
/// allocates `alloc_size` bytes.
///
/// # Examples
///
/// ```
/// use page_stream::Options;
///
/// let options = Options::default();
/// assert_eq!(options.page_size, 4096);
/// assert_eq!(options.alloc_size, 32 * 1024);
/// assert_eq!(options.page_floor(5000), 4096);
/// assert_eq!(options.page_ceil(5000), 8192);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Alignment unit for windows, in bytes. Must be a power of two.
    pub page_size: usize,

    /// Default buffer capacity at open, in bytes. Must be a multiple of `page_size`.
    pub alloc_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            page_size: Self::PAGE_SIZE,
            alloc_size: Self::ALLOC_SIZE,
        }
    }
}

impl Display for Options {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "page={} alloc={}", self.page_size, self.alloc_size)
    }
}

impl Options {
    /// Default page size is 4KB.
    pub const PAGE_SIZE: usize = 4096;
    /// Default allocation is eight pages.
    pub const ALLOC_SIZE: usize = Self::PAGE_SIZE * 8;

    // Environment variable names for configuration.
    pub const ENV_PAGE_SIZE: &str = "PAGE_STREAM_PAGE_SIZE";
    pub const ENV_ALLOC_SIZE: &str = "PAGE_STREAM_ALLOC_SIZE";

    /// Create options from environment variables if present.
    ///
    /// Invalid combinations fall back to the defaults.
    pub fn from_env() -> Self {
        // Parse environment variables only once and cache the result
        static CONFIG: OnceLock<Options> = OnceLock::new();

        *CONFIG.get_or_init(|| Self::from_lookup(|name| env::var(name).ok()))
    }

    /// Create options from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let options = Self {
            page_size: Self::parse_var(&lookup, Self::ENV_PAGE_SIZE, Self::PAGE_SIZE),
            alloc_size: Self::parse_var(&lookup, Self::ENV_ALLOC_SIZE, Self::ALLOC_SIZE),
        };

        if options.validate().is_ok() {
            options
        } else {
            Self::default()
        }
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the default allocation size.
    #[must_use]
    pub const fn with_alloc_size(mut self, alloc_size: usize) -> Self {
        self.alloc_size = alloc_size;
        self
    }

    /// Check the geometry invariants.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the page size is not a power of two or the
    /// allocation size is not a non-zero multiple of the page size.
    pub fn validate(&self) -> Result<()> {
        if !self.page_size.is_power_of_two() {
            return Err(Error::Config(format!(
                "page size {} is not a power of two",
                self.page_size
            )));
        }

        if self.alloc_size == 0 || self.alloc_size % self.page_size != 0 {
            return Err(Error::Config(format!(
                "allocation size {} is not a multiple of page size {}",
                self.alloc_size, self.page_size
            )));
        }

        Ok(())
    }

    /// Round an offset down to its page boundary.
    #[inline]
    pub const fn page_floor(&self, offset: u64) -> u64 {
        offset & !self.page_mask()
    }

    /// Round an offset up to the next page boundary, saturating at the last
    /// boundary representable in a `u64`.
    #[inline]
    pub const fn page_ceil(&self, offset: u64) -> u64 {
        offset.saturating_add(self.page_mask()) & !self.page_mask()
    }

    /// Whether an offset sits exactly on a page boundary.
    #[inline]
    pub const fn is_page_aligned(&self, offset: u64) -> bool {
        offset & self.page_mask() == 0
    }

    #[inline]
    const fn page_mask(&self) -> u64 {
        self.page_size as u64 - 1
    }

    fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> T
    where
        F: Fn(&str) -> Option<String>,
        T: FromStr,
    {
        lookup(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }
}
