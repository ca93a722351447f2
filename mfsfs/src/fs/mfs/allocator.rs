// SPDX-License-Identifier: MIT

use mfsio::prelude::*;

use crate::core::error::{FsAllocatorError, FsAllocatorResult};
use crate::fs::mfs::constant::*;
use crate::fs::mfs::meta::MfsMeta;

/// Run-length bucket map.
///
/// One 8-byte entry per bucket: a link to the next bucket of the chain and
/// the length of the contiguous run starting at that bucket. Free space is
/// itself kept as a chain of free runs, with `next_free` pointing at its
/// head. Only the head entry of a run carries meaningful data.
///
/// The map does not borrow the device; every operation takes the device as
/// an argument so callers can interleave map updates with data writes.
#[derive(Debug, Clone)]
pub struct BucketMap {
    map_sector: u64,
    bytes_per_sector: u64,
    bucket_count: u32,
    next_free: u32,
}

impl BucketMap {
    /// Writes a fresh map describing one free run covering every bucket.
    pub fn create<IO: DiskIO>(io: &mut IO, meta: &MfsMeta) -> FsAllocatorResult<Self> {
        let mut map = Self {
            map_sector: meta.map_sector,
            bytes_per_sector: meta.geometry.bytes_per_sector as u64,
            bucket_count: meta.bucket_count,
            next_free: 0,
        };

        io.zero_fill(
            map.map_sector * map.bytes_per_sector,
            (meta.map_region_sectors * map.bytes_per_sector) as usize,
        )?;
        map.write_entry(io, 0, MFS_END_OF_CHAIN, meta.bucket_count)?;
        io.flush()?;
        Ok(map)
    }

    /// Reattaches to an existing map. `next_free` comes from the master
    /// record; the map contents themselves stay on disk.
    pub fn open(meta: &MfsMeta, next_free: u32) -> Self {
        Self {
            map_sector: meta.map_sector,
            bytes_per_sector: meta.geometry.bytes_per_sector as u64,
            bucket_count: meta.bucket_count,
            next_free,
        }
    }

    #[inline]
    pub fn next_free_bucket(&self) -> u32 {
        self.next_free
    }

    /// Size of the map in bytes, as persisted in the master record.
    #[inline]
    pub fn size_of_map(&self) -> u64 {
        self.bucket_count as u64 * MFS_MAP_ENTRY_SIZE as u64
    }

    #[inline]
    fn entry_offset(&self, bucket: u32) -> u64 {
        self.map_sector * self.bytes_per_sector + bucket as u64 * MFS_MAP_ENTRY_SIZE as u64
    }

    fn check_bucket(&self, bucket: u32) -> FsAllocatorResult {
        if bucket >= self.bucket_count {
            return Err(FsAllocatorError::Other("Bucket index out of range"));
        }
        Ok(())
    }

    /// Reads the `(link, run length)` entry of `bucket`.
    pub fn get_bucket_length_and_link<IO: DiskIO>(
        &self,
        io: &mut IO,
        bucket: u32,
    ) -> FsAllocatorResult<(u32, u32)> {
        self.check_bucket(bucket)?;
        let offset = self.entry_offset(bucket);
        let link = io.read_u32_at(offset)?;
        let length = io.read_u32_at(offset + 4)?;
        Ok((link, length))
    }

    /// Relinks `bucket` to `next`, leaving its run length untouched.
    pub fn set_next_bucket<IO: DiskIO>(
        &mut self,
        io: &mut IO,
        bucket: u32,
        next: u32,
    ) -> FsAllocatorResult {
        self.check_bucket(bucket)?;
        io.write_u32_at(self.entry_offset(bucket), next)?;
        Ok(())
    }

    fn write_entry<IO: DiskIO>(
        &mut self,
        io: &mut IO,
        bucket: u32,
        link: u32,
        length: u32,
    ) -> FsAllocatorResult {
        self.check_bucket(bucket)?;
        let offset = self.entry_offset(bucket);
        io.write_u32_at(offset, link)?;
        io.write_u32_at(offset + 4, length)?;
        Ok(())
    }

    /// Allocates `count` buckets from the free chain.
    ///
    /// Consumes free runs starting at `next_free`; a run larger than the
    /// remainder is split, with the tail becoming the new free head. The
    /// allocated buckets form a chain terminated by END_OF_CHAIN.
    ///
    /// Returns the first bucket and the length of its run. Fails with
    /// `OutOfBuckets` when the free chain is exhausted; `next_free` is only
    /// advanced on success.
    pub fn allocate_buckets<IO: DiskIO>(
        &mut self,
        io: &mut IO,
        count: u32,
    ) -> FsAllocatorResult<(u32, u32)> {
        if count == 0 {
            return Err(FsAllocatorError::Other("Zero-length allocation"));
        }

        let start = self.next_free;
        let mut current = self.next_free;
        let mut remaining = count;
        let mut first_run = None;

        loop {
            if current == MFS_END_OF_CHAIN || current >= self.bucket_count {
                return Err(FsAllocatorError::OutOfBuckets);
            }

            let (link, length) = self.get_bucket_length_and_link(io, current)?;
            if length == 0 {
                return Err(FsAllocatorError::Other("Corrupt free chain entry"));
            }

            if length > remaining {
                // split the run; the tail becomes the new free head
                let tail = current + remaining;
                self.write_entry(io, tail, link, length - remaining)?;
                self.write_entry(io, current, MFS_END_OF_CHAIN, remaining)?;

                self.next_free = tail;
                return Ok((start, *first_run.get_or_insert(remaining)));
            }

            // whole run consumed; its link already points at the next free
            // run, which becomes the next run of this allocation
            first_run.get_or_insert(length);
            remaining -= length;

            if remaining == 0 {
                self.write_entry(io, current, MFS_END_OF_CHAIN, length)?;
                self.next_free = link;
                return Ok((start, first_run.unwrap_or(length)));
            }

            current = link;
        }
    }
}
