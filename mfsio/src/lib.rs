// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod errors;
mod macros;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std_io;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::DiskIO;
    pub use super::DiskIOExt;
    pub use super::DiskIOStructExt;
    pub use super::Geometry;
    pub use super::errors::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemDisk;

    #[cfg(feature = "std")]
    pub use super::std_io::StdDisk;
}

#[cfg(feature = "mem")]
pub use mem::MemDisk;
#[cfg(feature = "std")]
pub use std_io::StdDisk;

// Internal use
use errors::*;

// Constants

/// Maximum size of internal scratch buffer (used for zero-fill and struct ops).
/// 4 KiB = typical page size and the largest common sector size.
pub const BLOCK_BUF_SIZE: usize = 4096;

/// Physical geometry of a block device.
///
/// Only `bytes_per_sector` matters for addressing; the CHS hints are carried
/// through into boot metadata for legacy bootloaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub bytes_per_sector: u16,
    pub sectors_per_track: u16,
    pub heads_per_cylinder: u16,
}

impl Geometry {
    #[inline]
    pub const fn new(bytes_per_sector: u16, sectors_per_track: u16, heads_per_cylinder: u16) -> Self {
        Self {
            bytes_per_sector,
            sectors_per_track,
            heads_per_cylinder,
        }
    }
}

impl Default for Geometry {
    /// Classic 512-byte-sector hard-drive geometry (63 sectors, 255 heads).
    fn default() -> Self {
        Self::new(512, 63, 255)
    }
}

// Traits

/// Block device abstraction trait.
///
/// The core operations are byte-addressed read/write/flush; the sector view
/// required by filesystem code is layered on top in [`DiskIOExt`].
/// Implementations may target RAM, raw image files, or real block devices.
pub trait DiskIO {
    /// Geometry of the device. Fixed for the lifetime of the device.
    fn geometry(&self) -> Geometry;

    /// Total number of addressable sectors.
    fn sector_count(&self) -> u64;

    /// Writes `data` at `offset` (absolute, in bytes).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> DiskIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute, in bytes).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> DiskIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> DiskIOResult;
}

/// Extension helpers for [`DiskIO`].
///
/// Provides the sector-granular contract filesystem code relies on:
/// - sector reads/writes with alignment enforcement
/// - zero fill
/// - little-endian primitive reads/writes at arbitrary byte offsets
pub trait DiskIOExt: DiskIO {
    #[inline(always)]
    fn bytes_per_sector(&self) -> u64 {
        self.geometry().bytes_per_sector as u64
    }

    /// Reads whole sectors starting at `sector` into `buf`.
    ///
    /// `buf.len()` must be an exact multiple of the sector size.
    #[inline(always)]
    fn read_sectors(&mut self, sector: u64, buf: &mut [u8]) -> DiskIOResult {
        let bps = self.bytes_per_sector();
        if buf.len() as u64 % bps != 0 {
            return Err(DiskIOError::Unaligned);
        }
        self.read_at(sector * bps, buf)
    }

    /// Reads `count` whole sectors starting at `sector` into a fresh buffer.
    #[cfg(feature = "alloc")]
    #[inline(always)]
    fn read_sectors_vec(&mut self, sector: u64, count: u64) -> DiskIOResult<alloc::vec::Vec<u8>> {
        let bps = self.bytes_per_sector();
        let mut buf = alloc::vec![0u8; (count * bps) as usize];
        self.read_sectors(sector, &mut buf)?;
        Ok(buf)
    }

    /// Writes whole sectors starting at `sector`.
    ///
    /// `data.len()` must be an exact multiple of the sector size. When
    /// `flush_now` is set the device is flushed before returning.
    #[inline(always)]
    fn write_sectors(&mut self, sector: u64, data: &[u8], flush_now: bool) -> DiskIOResult {
        let bps = self.bytes_per_sector();
        if data.len() as u64 % bps != 0 {
            return Err(DiskIOError::Unaligned);
        }
        self.write_at(sector * bps, data)?;
        if flush_now {
            self.flush()?;
        }
        Ok(())
    }

    /// Fills a byte region with zeroes.
    ///
    /// Used for wiping freshly allocated buckets and reserved regions.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> DiskIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    // Implements read/write helpers for primitive types (u16, u32, u64)
    crate::disk_impl_primitive_rw!(u16, u32, u64);
}

impl<T: DiskIO + ?Sized> DiskIOExt for T {}

/// Extension trait for reading and writing on-disk structures using zerocopy.
///
/// Requires the struct to implement the zerocopy traits for safe conversion.
pub trait DiskIOStructExt: DiskIO {
    /// Reads a struct of type `T` from the given byte offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> DiskIOResult<T> {
        let size = core::mem::size_of::<T>();
        assert!(size <= BLOCK_BUF_SIZE, "read_struct: type too large");
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| DiskIOError::Other("read_struct failed"))
    }

    /// Writes a struct of type `T` at the given byte offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> DiskIOResult {
        let bytes = val.as_bytes();
        self.write_at(offset, bytes)
    }
}

impl<T: DiskIO + ?Sized> DiskIOStructExt for T {}
