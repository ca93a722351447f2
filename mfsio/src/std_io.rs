// SPDX-License-Identifier: MIT

use std::io::{Error, Read, Seek, SeekFrom, Write};

use crate::{DiskIO, DiskIOError, DiskIOResult, Geometry};

/// File-backed implementation of `DiskIO` for raw disk images.
///
/// The caller supplies the geometry and total sector count; the stream is
/// expected to be at least `sector_count * bytes_per_sector` bytes long
/// (sparse files are fine).
#[derive(Debug)]
pub struct StdDisk<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    geometry: Geometry,
    sector_count: u64,
}

impl<'a, T: Read + Write + Seek> StdDisk<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T, sector_count: u64) -> Self {
        Self::with_geometry(io, Geometry::default(), sector_count)
    }

    #[inline]
    pub fn with_geometry(io: &'a mut T, geometry: Geometry, sector_count: u64) -> Self {
        Self {
            io,
            geometry,
            sector_count,
        }
    }
}

impl<'a, T: Read + Write + Seek> DiskIO for StdDisk<'a, T> {
    #[inline]
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    fn sector_count(&self) -> u64 {
        self.sector_count
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> DiskIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> DiskIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> DiskIOResult {
        self.io.flush()?;
        Ok(())
    }
}

impl From<Error> for DiskIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        // Leak the string to produce a 'static str. Acceptable for error mapping.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        DiskIOError::Other(leaked_str)
    }
}
