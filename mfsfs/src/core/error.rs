// SPDX-License-Identifier: MIT

use core::fmt;

pub use mfsio::errors::*;

#[derive(Debug, Clone)]
pub enum FsAllocatorError {
    IO(DiskIOError),
    OutOfBuckets,
    Other(&'static str),
}

impl FsAllocatorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsAllocatorError::IO(_) => "IO error",
            FsAllocatorError::OutOfBuckets => "Out of buckets",
            FsAllocatorError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsAllocatorError::IO(e) => Some(FsError::IO(e.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FsResolverError {
    IO(DiskIOError),
    Allocator(FsAllocatorError),
    NotFound,
    NotADirectory,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsResolverError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsResolverError::IO(_) => "IO error",
            FsResolverError::Allocator(_) => "Allocator error",
            FsResolverError::NotFound => "Record not found",
            FsResolverError::NotADirectory => "Path component is not a directory",
            FsResolverError::Invalid(msg) => msg,
            FsResolverError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsResolverError::IO(e) => Some(FsError::IO(e.clone())),
            FsResolverError::Allocator(e) => Some(FsError::Allocator(e.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FsFormatterError {
    IO(DiskIOError),
    Allocator(FsAllocatorError),
    MissingBootloader,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsFormatterError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsFormatterError::IO(_) => "IO error",
            FsFormatterError::Allocator(_) => "Allocator error",
            FsFormatterError::MissingBootloader => "Bootloader image is missing",
            FsFormatterError::Invalid(msg) => msg,
            FsFormatterError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsFormatterError::IO(e) => Some(FsError::IO(e.clone())),
            FsFormatterError::Allocator(e) => Some(FsError::Allocator(e.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FsInjectorError {
    IO(DiskIOError),
    Allocator(FsAllocatorError),
    Resolver(FsResolverError),
    NameTooLong,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsInjectorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsInjectorError::IO(_) => "IO error",
            FsInjectorError::Allocator(_) => "Allocator error",
            FsInjectorError::Resolver(_) => "Resolver error",
            FsInjectorError::NameTooLong => "Record name is too long",
            FsInjectorError::Invalid(msg) => msg,
            FsInjectorError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsInjectorError::IO(e) => Some(FsError::IO(e.clone())),
            FsInjectorError::Allocator(e) => Some(FsError::Allocator(e.clone())),
            FsInjectorError::Resolver(e) => Some(FsError::Resolver(e.clone())),
            _ => None,
        }
    }
}

/// Top-level error
#[derive(Debug, Clone)]
pub enum FsError {
    IO(DiskIOError),
    Allocator(FsAllocatorError),
    Resolver(FsResolverError),
    Formatter(FsFormatterError),
    Injector(FsInjectorError),
    NotReady,
    Closed,
    Other(&'static str),
}

// === impl From ===

impl From<DiskIOError> for FsAllocatorError {
    fn from(e: DiskIOError) -> Self {
        FsAllocatorError::IO(e)
    }
}

impl From<DiskIOError> for FsResolverError {
    fn from(e: DiskIOError) -> Self {
        FsResolverError::IO(e)
    }
}

impl From<FsAllocatorError> for FsResolverError {
    fn from(e: FsAllocatorError) -> Self {
        FsResolverError::Allocator(e)
    }
}

impl From<DiskIOError> for FsFormatterError {
    fn from(e: DiskIOError) -> Self {
        FsFormatterError::IO(e)
    }
}

impl From<FsAllocatorError> for FsFormatterError {
    fn from(e: FsAllocatorError) -> Self {
        FsFormatterError::Allocator(e)
    }
}

impl From<DiskIOError> for FsInjectorError {
    fn from(e: DiskIOError) -> Self {
        FsInjectorError::IO(e)
    }
}

impl From<FsAllocatorError> for FsInjectorError {
    fn from(e: FsAllocatorError) -> Self {
        FsInjectorError::Allocator(e)
    }
}

impl From<FsResolverError> for FsInjectorError {
    fn from(e: FsResolverError) -> Self {
        FsInjectorError::Resolver(e)
    }
}

// === impl From to FsError top-level ===

impl From<DiskIOError> for FsError {
    fn from(e: DiskIOError) -> Self {
        FsError::IO(e)
    }
}

impl From<FsAllocatorError> for FsError {
    fn from(e: FsAllocatorError) -> Self {
        FsError::Allocator(e)
    }
}

impl From<FsResolverError> for FsError {
    fn from(e: FsResolverError) -> Self {
        FsError::Resolver(e)
    }
}

impl From<FsFormatterError> for FsError {
    fn from(e: FsFormatterError) -> Self {
        FsError::Formatter(e)
    }
}

impl From<FsInjectorError> for FsError {
    fn from(e: FsInjectorError) -> Self {
        FsError::Injector(e)
    }
}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;

pub type FsAllocatorResult<T = ()> = Result<T, FsAllocatorError>;
pub type FsResolverResult<T = ()> = Result<T, FsResolverError>;
pub type FsFormatterResult<T = ()> = Result<T, FsFormatterError>;
pub type FsInjectorResult<T = ()> = Result<T, FsInjectorError>;

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Allocator(e) => e.msg(),
            FsError::Resolver(e) => e.msg(),
            FsError::Formatter(e) => e.msg(),
            FsError::Injector(e) => e.msg(),
            FsError::NotReady => "Filesystem is not formatted or opened",
            FsError::Closed => "Filesystem session is already closed",
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Allocator(e) => e.source(),
            FsError::Resolver(e) => e.source(),
            FsError::Formatter(e) => e.source(),
            FsError::Injector(e) => e.source(),
            _ => None,
        }
    }
}
