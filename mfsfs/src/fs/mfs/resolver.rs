// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use mfsio::prelude::*;
use zerocopy::FromBytes;

use crate::core::error::{FsResolverError, FsResolverResult};
use crate::core::utils::path_utils::{sanitize_path, split_path};
use crate::fs::mfs::allocator::BucketMap;
use crate::fs::mfs::constant::*;
use crate::fs::mfs::meta::MfsMeta;
use crate::fs::mfs::types::record::{MfsRecord, RecordSlot};

/// Walks every slot of the directory chain starting at `dir_bucket`,
/// calling `visit` with the slot, the bucket run it lives in, the run
/// length and the slot index within that run. Stops early when `visit`
/// yields a record.
pub(crate) fn walk_slots<IO, F>(
    io: &mut IO,
    map: &BucketMap,
    meta: &MfsMeta,
    dir_bucket: u32,
    mut visit: F,
) -> FsResolverResult<Option<MfsRecord>>
where
    IO: DiskIO,
    F: FnMut(&RecordSlot, u32, u32, u32) -> Option<MfsRecord>,
{
    let mut bucket = dir_bucket;
    while bucket != MFS_END_OF_CHAIN {
        let (link, length) = map.get_bucket_length_and_link(io, bucket)?;
        let data = io.read_sectors_vec(
            meta.bucket_to_sector(bucket),
            length as u64 * meta.bucket_size as u64,
        )?;

        for (index, chunk) in data.chunks_exact(MFS_RECORD_SIZE).enumerate() {
            let slot = RecordSlot::ref_from_bytes(chunk)
                .map_err(|_| FsResolverError::Invalid("Malformed record slot"))?;
            if let Some(found) = visit(slot, bucket, length, index as u32) {
                return Ok(Some(found));
            }
        }

        bucket = link;
    }
    Ok(None)
}

/// Looks `name` up in the directory chain starting at `dir_bucket`.
pub(crate) fn find_record<IO: DiskIO>(
    io: &mut IO,
    map: &BucketMap,
    meta: &MfsMeta,
    dir_bucket: u32,
    name: &str,
) -> FsResolverResult<Option<MfsRecord>> {
    walk_slots(io, map, meta, dir_bucket, |slot, bucket, length, index| {
        MfsRecord::decode(slot, bucket, length, index).filter(|record| record.name == name)
    })
}

/// Read-only path and content lookups on a mounted filesystem.
pub struct MfsResolver<'a, IO: DiskIO> {
    io: &'a mut IO,
    map: &'a BucketMap,
    meta: &'a MfsMeta,
    root_bucket: u32,
}

impl<'a, IO: DiskIO> MfsResolver<'a, IO> {
    pub fn new(io: &'a mut IO, map: &'a BucketMap, meta: &'a MfsMeta, root_bucket: u32) -> Self {
        Self {
            io,
            map,
            meta,
            root_bucket,
        }
    }

    /// The root directory has no slot on disk; synthesize its record from
    /// the map entry of the root chain.
    fn root_record(&mut self) -> FsResolverResult<MfsRecord> {
        let (_, length) = self
            .map
            .get_bucket_length_and_link(self.io, self.root_bucket)?;
        Ok(MfsRecord::root(self.root_bucket, length))
    }

    /// Resolves `path` to its record.
    ///
    /// Intermediate components must be directories; the final component may
    /// be either a file or a directory.
    pub fn find_path(&mut self, path: &str) -> FsResolverResult<MfsRecord> {
        let sanitized = sanitize_path(path);
        let tokens = split_path(&sanitized);

        let mut current = self.root_record()?;
        for token in tokens {
            if !current.is_directory() {
                return Err(FsResolverError::NotADirectory);
            }
            current = find_record(self.io, self.map, self.meta, current.bucket, token)?
                .ok_or(FsResolverError::NotFound)?;
        }
        Ok(current)
    }

    /// Lists the records of the directory at `path`.
    pub fn list_path(&mut self, path: &str) -> FsResolverResult<Vec<MfsRecord>> {
        let directory = self.find_path(path)?;
        if !directory.is_directory() {
            return Err(FsResolverError::NotADirectory);
        }

        let mut records = Vec::new();
        walk_slots(
            self.io,
            self.map,
            self.meta,
            directory.bucket,
            |slot, bucket, length, index| {
                if let Some(record) = MfsRecord::decode(slot, bucket, length, index) {
                    records.push(record);
                }
                None
            },
        )?;
        Ok(records)
    }

    /// Reads the full contents of the file at `path`.
    pub fn read_path(&mut self, path: &str) -> FsResolverResult<Vec<u8>> {
        let record = self.find_path(path)?;
        if record.is_directory() {
            return Err(FsResolverError::Invalid("Path is a directory"));
        }
        self.read_record(&record)
    }

    /// Reads `record.size` bytes by walking the record's bucket chain.
    pub fn read_record(&mut self, record: &MfsRecord) -> FsResolverResult<Vec<u8>> {
        let mut contents = Vec::with_capacity(record.size as usize);
        let mut bucket = record.bucket;

        while bucket != MFS_END_OF_CHAIN && (contents.len() as u64) < record.size {
            let (link, length) = self.map.get_bucket_length_and_link(self.io, bucket)?;
            let run_bytes = length as usize * self.meta.bucket_size_bytes();
            let wanted = (record.size - contents.len() as u64).min(run_bytes as u64) as usize;

            let offset = self.meta.bucket_to_sector(bucket) * self.io.bytes_per_sector();
            let run_start = contents.len();
            contents.resize(run_start + wanted, 0);
            self.io.read_at(offset, &mut contents[run_start..])?;

            bucket = link;
        }

        if (contents.len() as u64) < record.size {
            return Err(FsResolverError::Invalid("Bucket chain shorter than size"));
        }
        Ok(contents)
    }
}
