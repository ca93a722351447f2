// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec;

use log::{debug, info};
use mfsio::prelude::*;
use zerocopy::IntoBytes;

use crate::core::error::FsFormatterResult;
use crate::fs::mfs::allocator::BucketMap;
use crate::fs::mfs::constant::*;
use crate::fs::mfs::meta::MfsMeta;
use crate::fs::mfs::types::boot::{MfsMasterRecord, MfsVbr};

/// Result of a format: the live bucket map plus the well-known chains.
pub struct FormatOutcome {
    pub map: BucketMap,
    pub root_bucket: u32,
    pub journal_bucket: u32,
    pub bad_bucket: u32,
}

/// Writes the empty filesystem structures for the layout in [`MfsMeta`].
pub struct MfsFormatter<'a, IO: DiskIO> {
    io: &'a mut IO,
    meta: &'a MfsMeta,
}

impl<'a, IO: DiskIO> MfsFormatter<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a MfsMeta) -> Self {
        Self { io, meta }
    }

    pub fn format(mut self) -> FsFormatterResult<FormatOutcome> {
        let meta = self.meta;
        info!(
            "format: partition '{}', {} sectors, bucket size {}",
            meta.partition_name, meta.sector_count, meta.bucket_size
        );
        debug!(
            "format: master record at {}, mirror at {}, map at {}",
            meta.master_sector, meta.master_mirror_sector, meta.map_sector
        );

        let mut map = BucketMap::create(self.io, meta)?;

        // well-known chains; allocated from a fresh map, so each one is a
        // single contiguous run
        let (root_bucket, _) = map.allocate_buckets(self.io, MFS_ROOT_BUCKETS)?;
        let (journal_bucket, _) = map.allocate_buckets(self.io, MFS_JOURNAL_BUCKETS)?;
        let (bad_bucket, _) = map.allocate_buckets(self.io, MFS_BAD_LIST_BUCKETS)?;
        debug!(
            "format: root {}, journal {}, bad-list {}, free cursor {}",
            root_bucket,
            journal_bucket,
            bad_bucket,
            map.next_free_bucket()
        );

        self.wipe_buckets(root_bucket, MFS_ROOT_BUCKETS)?;
        self.wipe_buckets(journal_bucket, MFS_JOURNAL_BUCKETS)?;
        self.wipe_buckets(bad_bucket, MFS_BAD_LIST_BUCKETS)?;

        let master = MfsMasterRecord::from_meta(
            meta,
            root_bucket,
            journal_bucket,
            bad_bucket,
            map.next_free_bucket(),
            map.size_of_map(),
        );
        self.write_master_record(&master)?;
        self.write_vbr()?;

        info!("format: done, {} buckets available", meta.bucket_count);
        Ok(FormatOutcome {
            map,
            root_bucket,
            journal_bucket,
            bad_bucket,
        })
    }

    fn wipe_buckets(&mut self, bucket: u32, count: u32) -> FsFormatterResult {
        let offset = self.meta.bucket_to_sector(bucket) * self.io.bytes_per_sector();
        let len = count as usize * self.meta.bucket_size_bytes();
        self.io.zero_fill(offset, len)?;
        Ok(())
    }

    /// Writes the master record to its primary and mirror sectors.
    fn write_master_record(&mut self, master: &MfsMasterRecord) -> FsFormatterResult {
        let bps = self.io.bytes_per_sector() as usize;
        let mut sector = vec![0u8; bps];
        sector[..MFS_MASTER_RECORD_SIZE].copy_from_slice(master.as_bytes());

        self.io
            .write_sectors(self.meta.master_sector, &sector, true)?;
        self.io
            .write_sectors(self.meta.master_mirror_sector, &sector, true)?;
        Ok(())
    }

    fn write_vbr(&mut self) -> FsFormatterResult {
        let vbr = MfsVbr::from_meta(self.meta);
        let bps = self.io.bytes_per_sector() as usize;
        let mut sector = vec![0u8; bps];
        sector[..vbr.as_bytes().len()].copy_from_slice(vbr.as_bytes());

        self.io.write_sectors(self.meta.start_sector, &sector, true)?;
        Ok(())
    }
}
