// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for DiskIO operations.
pub type DiskIOResult<T = ()> = core::result::Result<T, DiskIOError>;

/// Error type for DiskIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskIOError {
    Other(&'static str),
    OutOfBounds,
    Unaligned,
    Unsupported,
}

impl DiskIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            DiskIOError::Other(msg) => msg,
            DiskIOError::OutOfBounds => "Out of bounds",
            DiskIOError::Unaligned => "Buffer is not a multiple of the sector size",
            DiskIOError::Unsupported => "Unsupported operation",
        }
    }
}

impl From<&'static str> for DiskIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        DiskIOError::Other(msg)
    }
}

impl fmt::Display for DiskIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        Ok(())
    }
}
