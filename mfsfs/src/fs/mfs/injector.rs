// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{string::ToString, vec};

use log::debug;
use mfsio::prelude::*;

use crate::core::error::{FsInjectorError, FsInjectorResult};
use crate::core::utils::path_utils::{sanitize_path, split_path};
use crate::fs::mfs::allocator::BucketMap;
use crate::fs::mfs::constant::*;
use crate::fs::mfs::meta::MfsMeta;
use crate::fs::mfs::resolver::{find_record, walk_slots};
use crate::fs::mfs::types::record::{MfsRecord, RecordFlags, RecordSlot};

/// Mutating operations: record creation, chain growth and content writes.
pub struct MfsInjector<'a, IO: DiskIO> {
    io: &'a mut IO,
    map: &'a mut BucketMap,
    meta: &'a MfsMeta,
    root_bucket: u32,
}

impl<'a, IO: DiskIO> MfsInjector<'a, IO> {
    pub fn new(
        io: &'a mut IO,
        map: &'a mut BucketMap,
        meta: &'a MfsMeta,
        root_bucket: u32,
    ) -> Self {
        Self {
            io,
            map,
            meta,
            root_bucket,
        }
    }

    fn root_record(&mut self) -> FsInjectorResult<MfsRecord> {
        let (_, length) = self
            .map
            .get_bucket_length_and_link(self.io, self.root_bucket)?;
        Ok(MfsRecord::root(self.root_bucket, length))
    }

    fn slot_offset(&self, record: &MfsRecord) -> u64 {
        self.meta.bucket_to_sector(record.directory_bucket)
            * self.meta.geometry.bytes_per_sector as u64
            + record.directory_index as u64 * MFS_RECORD_SIZE as u64
    }

    /// Persists `record` into its directory slot.
    pub fn write_record(&mut self, record: &MfsRecord) -> FsInjectorResult {
        if record.directory_bucket == MFS_END_OF_CHAIN {
            return Err(FsInjectorError::Invalid("Root directory has no slot"));
        }

        let offset = self.slot_offset(record);
        let mut slot: RecordSlot = self.io.read_struct(offset)?;
        record.encode_into(&mut slot)?;
        self.io.write_struct(offset, &slot)?;
        Ok(())
    }

    /// Creates a fresh record named `name` inside `directory`, growing the
    /// directory chain when every slot is taken. Directories get their
    /// initial bucket chain allocated and wiped immediately.
    pub fn create_record(
        &mut self,
        directory: &MfsRecord,
        name: &str,
        flags: RecordFlags,
    ) -> FsInjectorResult<MfsRecord> {
        let free_slot = walk_slots(
            self.io,
            self.map,
            self.meta,
            directory.bucket,
            |slot, bucket, length, index| {
                if slot.is_in_use() {
                    return None;
                }
                Some(MfsRecord {
                    directory_bucket: bucket,
                    directory_length: length,
                    directory_index: index,
                    ..Default::default()
                })
            },
        )?;

        let mut record = match free_slot {
            Some(slot) => slot,
            None => {
                let (bucket, length) = self.expand_directory(directory)?;
                MfsRecord {
                    directory_bucket: bucket,
                    directory_length: length,
                    directory_index: 0,
                    ..Default::default()
                }
            }
        };

        record.name = name.to_string();
        record.flags = flags | RecordFlags::IN_USE;
        record.bucket = MFS_END_OF_CHAIN;
        record.bucket_length = 0;

        if record.flags.contains(RecordFlags::DIRECTORY) {
            self.initiate_directory(&mut record)?;
        }

        self.write_record(&record)?;
        debug!(
            "create_record: '{}' in bucket {} slot {}",
            record.name, record.directory_bucket, record.directory_index
        );
        Ok(record)
    }

    /// Resolves `path`, creating any missing components. Missing
    /// intermediates become directories; the final component is created
    /// with `flags`. An existing final component is returned as-is.
    pub fn create_path(&mut self, path: &str, flags: RecordFlags) -> FsInjectorResult<MfsRecord> {
        let sanitized = sanitize_path(path);
        let tokens = split_path(&sanitized);
        if tokens.is_empty() {
            return self.root_record();
        }

        let last = tokens.len() - 1;
        let mut current = self.root_record()?;
        for (i, token) in tokens.iter().enumerate() {
            if !current.is_directory() {
                return Err(FsInjectorError::Invalid(
                    "Path component is not a directory",
                ));
            }

            let existing = find_record(self.io, self.map, self.meta, current.bucket, token)?;
            current = match existing {
                Some(record) => record,
                None => {
                    let flags = if i < last {
                        RecordFlags::DIRECTORY
                    } else {
                        flags
                    };
                    self.create_record(&current, token, flags)?
                }
            };
        }
        Ok(current)
    }

    /// Grows `record`'s bucket chain until it can hold `required` bytes.
    /// Already-sufficient allocations are left untouched.
    pub fn ensure_bucket_space(
        &mut self,
        record: &mut MfsRecord,
        required: u64,
    ) -> FsInjectorResult {
        if required <= record.allocated_size {
            return Ok(());
        }

        let bucket_bytes = self.meta.bucket_size_bytes() as u64;
        let buckets_needed = (required - record.allocated_size).div_ceil(bucket_bytes) as u32;
        let (start, first_run) = self.map.allocate_buckets(self.io, buckets_needed)?;

        if record.bucket == MFS_END_OF_CHAIN {
            record.bucket = start;
            record.bucket_length = first_run;
        } else {
            let tail = self.chain_tail(record.bucket)?;
            self.map.set_next_bucket(self.io, tail, start)?;
        }
        record.allocated_size += buckets_needed as u64 * bucket_bytes;

        debug!(
            "ensure_bucket_space: '{}' grown by {} buckets at {}",
            record.name, buckets_needed, start
        );
        Ok(())
    }

    /// Writes `data` into `record`'s bucket chain, zero-padding the run
    /// containing the tail of the data. The chain must already be large
    /// enough.
    pub fn fill_bucket_chain(&mut self, record: &MfsRecord, data: &[u8]) -> FsInjectorResult {
        if data.len() as u64 > record.allocated_size {
            return Err(FsInjectorError::Invalid("Data exceeds allocated chain"));
        }

        let mut bucket = record.bucket;
        let mut written = 0usize;

        while bucket != MFS_END_OF_CHAIN && written < data.len() {
            let (link, length) = self.map.get_bucket_length_and_link(self.io, bucket)?;
            let run_bytes = length as usize * self.meta.bucket_size_bytes();

            let chunk = (data.len() - written).min(run_bytes);
            let mut window = vec![0u8; run_bytes];
            window[..chunk].copy_from_slice(&data[written..written + chunk]);

            self.io
                .write_sectors(self.meta.bucket_to_sector(bucket), &window, false)?;

            written += chunk;
            bucket = link;
        }

        if written < data.len() {
            return Err(FsInjectorError::Invalid("Bucket chain ended early"));
        }
        self.io.flush()?;
        Ok(())
    }

    /// Allocates and wipes the initial chain of a new directory.
    fn initiate_directory(&mut self, record: &mut MfsRecord) -> FsInjectorResult {
        let (start, first_run) = self.map.allocate_buckets(self.io, MFS_EXPAND_BUCKETS)?;
        record.bucket = start;
        record.bucket_length = first_run;
        record.allocated_size =
            MFS_EXPAND_BUCKETS as u64 * self.meta.bucket_size_bytes() as u64;
        self.wipe_chain(start)?;
        Ok(())
    }

    /// Appends a fresh, wiped run of buckets to the directory chain.
    /// Returns the head bucket and length of the new run.
    fn expand_directory(&mut self, directory: &MfsRecord) -> FsInjectorResult<(u32, u32)> {
        let (start, first_run) = self.map.allocate_buckets(self.io, MFS_EXPAND_BUCKETS)?;
        let tail = self.chain_tail(directory.bucket)?;
        self.map.set_next_bucket(self.io, tail, start)?;
        self.wipe_chain(start)?;
        debug!(
            "expand_directory: chain {} extended with {} buckets at {}",
            directory.bucket, MFS_EXPAND_BUCKETS, start
        );
        Ok((start, first_run))
    }

    fn chain_tail(&mut self, bucket: u32) -> FsInjectorResult<u32> {
        let mut current = bucket;
        loop {
            let (link, _) = self.map.get_bucket_length_and_link(self.io, current)?;
            if link == MFS_END_OF_CHAIN {
                return Ok(current);
            }
            current = link;
        }
    }

    /// Zeroes every bucket reachable from `bucket`, covering chains that
    /// span multiple runs.
    fn wipe_chain(&mut self, bucket: u32) -> FsInjectorResult {
        let bps = self.meta.geometry.bytes_per_sector as u64;
        let mut current = bucket;
        while current != MFS_END_OF_CHAIN {
            let (link, length) = self.map.get_bucket_length_and_link(self.io, current)?;
            self.io.zero_fill(
                self.meta.bucket_to_sector(current) * bps,
                length as usize * self.meta.bucket_size_bytes(),
            )?;
            current = link;
        }
        Ok(())
    }
}
