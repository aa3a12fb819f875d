//! Type-safe byte counts for compression reporting.

use std::fmt;

/// Byte size with safe arithmetic and human-readable display.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileSize(u64);

impl FileSize {
    pub const ZERO: FileSize = FileSize(0);

    pub const KB: u64 = 1024;
    pub const MB: u64 = 1024 * 1024;
    pub const GB: u64 = 1024 * 1024 * 1024;

    #[inline]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn saturating_sub(&self, other: FileSize) -> FileSize {
        FileSize(self.0.saturating_sub(other.0))
    }

    #[inline]
    pub fn saturating_add(&self, other: FileSize) -> FileSize {
        FileSize(self.0.saturating_add(other.0))
    }

    /// `self / original`; `None` when the original is zero.
    pub fn compression_ratio(&self, original: FileSize) -> Option<f64> {
        if original.0 == 0 {
            None
        } else {
            Some(self.0 as f64 / original.0 as f64)
        }
    }

    /// `(self - original) / original * 100`; negative means smaller.
    pub fn size_change_percent(&self, original: FileSize) -> Option<f64> {
        if original.0 == 0 {
            None
        } else {
            Some((self.0 as f64 - original.0 as f64) / original.0 as f64 * 100.0)
        }
    }

    /// Formatted with an auto-selected unit.
    pub fn display(&self) -> String {
        if self.0 >= Self::GB {
            format!("{:.2} GB", self.0 as f64 / Self::GB as f64)
        } else if self.0 >= Self::MB {
            format!("{:.2} MB", self.0 as f64 / Self::MB as f64)
        } else if self.0 >= Self::KB {
            format!("{:.2} KB", self.0 as f64 / Self::KB as f64)
        } else {
            format!("{} B", self.0)
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSize({} = {})", self.0, self.display())
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl Default for FileSize {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u64> for FileSize {
    fn from(bytes: u64) -> Self {
        Self::new(bytes)
    }
}

impl From<FileSize> for u64 {
    fn from(size: FileSize) -> Self {
        size.0
    }
}
