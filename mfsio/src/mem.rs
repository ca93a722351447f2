// SPDX-License-Identifier: MIT

use crate::{DiskIO, DiskIOError, DiskIOResult, Geometry};

/// In-memory implementation of `DiskIO`.
///
/// Useful for tests and RAM-backed disk images. The buffer length must be a
/// multiple of the sector size; trailing bytes are not addressable.
#[derive(Debug)]
pub struct MemDisk<'a> {
    buffer: &'a mut [u8],
    geometry: Geometry,
}

impl<'a> MemDisk<'a> {
    /// Wraps `buffer` with the default 512-byte-sector geometry.
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self::with_geometry(buffer, Geometry::default())
    }

    #[inline]
    pub fn with_geometry(buffer: &'a mut [u8], geometry: Geometry) -> Self {
        Self { buffer, geometry }
    }

    #[inline]
    fn check_bounds(&self, offset: u64, len: usize) -> DiskIOResult {
        let end = offset
            .checked_add(len as u64)
            .ok_or(DiskIOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(DiskIOError::OutOfBounds);
        }
        Ok(())
    }
}

impl<'a> DiskIO for MemDisk<'a> {
    #[inline]
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    fn sector_count(&self) -> u64 {
        self.buffer.len() as u64 / self.geometry.bytes_per_sector as u64
    }

    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> DiskIOResult {
        self.check_bounds(offset, data.len())?;
        let dst = &mut self.buffer[offset as usize..offset as usize + data.len()];
        dst.copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> DiskIOResult {
        self.check_bounds(offset, buf.len())?;
        let src = &self.buffer[offset as usize..offset as usize + buf.len()];
        buf.copy_from_slice(src);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> DiskIOResult {
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod test {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_rw() {
        let mut buf = [0u8; 1024];
        let mut io = MemDisk::new(&mut buf);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut buf = [0u8; 64];
        let mut io = MemDisk::new(&mut buf);
        assert_eq!(io.write_at(60, &[0u8; 8]), Err(DiskIOError::OutOfBounds));

        let mut output = [0u8; 8];
        assert_eq!(io.read_at(60, &mut output), Err(DiskIOError::OutOfBounds));
    }

    #[test]
    fn test_sector_rw_enforces_alignment() {
        let mut buf = [0u8; 2048];
        let mut io = MemDisk::new(&mut buf);
        assert_eq!(io.sector_count(), 4);

        let sector = [0xABu8; 512];
        io.write_sectors(2, &sector, true).unwrap();

        let mut output = [0u8; 512];
        io.read_sectors(2, &mut output).unwrap();
        assert_eq!(output[..], sector[..]);

        assert_eq!(
            io.write_sectors(0, &[0u8; 100], false),
            Err(DiskIOError::Unaligned)
        );
        assert_eq!(
            io.read_sectors(0, &mut [0u8; 100]),
            Err(DiskIOError::Unaligned)
        );
    }

    #[test]
    fn test_primitive_rw() {
        let mut buf = [0u8; 64];
        let mut io = MemDisk::new(&mut buf);

        io.write_u32_at(4, 0xDEADBEEF).unwrap();
        io.write_u64_at(8, 0x1122334455667788).unwrap();

        assert_eq!(io.read_u32_at(4).unwrap(), 0xDEADBEEF);
        assert_eq!(io.read_u64_at(8).unwrap(), 0x1122334455667788);
        // little-endian on disk
        assert_eq!(buf[4], 0xEF);
    }

    #[test]
    fn test_zero_fill() {
        let mut buf = [0xFF; 64];
        let mut io = MemDisk::new(&mut buf);

        io.zero_fill(10, 8).unwrap();

        let mut output = [0xAA; 8];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [0u8; 8]);
    }
}
