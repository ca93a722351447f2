// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::string::String;

use mfsio::Geometry;

use crate::core::error::{FsFormatterError, FsFormatterResult};
use crate::fs::mfs::constant::*;
use crate::fs::mfs::types::boot::{MfsMasterRecord, MfsVbr, PartitionFlags};

/// Resolved on-disk geometry of one MFS partition.
///
/// All `*_sector` fields are absolute disk sectors; the values persisted in
/// the VBR and master record are partition-relative and converted on the
/// way in and out. The partition is laid out as reserved sectors (VBR,
/// optional stage-2 image, mirror master record), then the bucket map, then
/// the bucket heap.
#[derive(Debug, Clone)]
pub struct MfsMeta {
    pub geometry: Geometry,
    pub start_sector: u64,
    pub sector_count: u64,

    /// Reserved region size, rounded up to a whole number of buckets.
    pub reserved_sectors: u16,
    /// Bucket size in sectors.
    pub bucket_size: u16,

    pub master_sector: u64,
    pub master_mirror_sector: u64,
    pub map_sector: u64,
    /// Sectors occupied by the bucket map, rounded up to whole buckets so
    /// the bucket heap stays bucket-aligned.
    pub map_region_sectors: u64,
    pub bucket_count: u32,

    pub partition_name: String,
    pub partition_flags: PartitionFlags,
    pub bootable: bool,
}

impl MfsMeta {
    /// Computes the layout for a fresh format.
    ///
    /// `reserved_sectors` is the raw requirement (VBR plus any stage-2
    /// image); the master record lands right after it and the whole region
    /// is then rounded up to a bucket boundary, with the mirror master
    /// record occupying the last reserved sector.
    pub fn for_format(
        geometry: Geometry,
        start_sector: u64,
        sector_count: u64,
        reserved_sectors: u16,
        partition_name: String,
        partition_flags: PartitionFlags,
        bootable: bool,
    ) -> FsFormatterResult<Self> {
        let bytes_per_sector = geometry.bytes_per_sector as u64;
        let partition_bytes = sector_count * bytes_per_sector;
        let bucket_size = determine_bucket_size(partition_bytes);

        let master_offset = reserved_sectors as u64;
        let reserved_rounded =
            ((reserved_sectors as u32 + 1) / bucket_size as u32 + 1) * bucket_size as u32;
        if reserved_rounded > u16::MAX as u32 || reserved_rounded as u64 >= sector_count {
            return Err(FsFormatterError::Invalid(
                "Reserved region does not fit the partition",
            ));
        }

        let (map_region_sectors, bucket_count) = converge_map_layout(
            bytes_per_sector,
            sector_count - reserved_rounded as u64,
            bucket_size,
        );
        if bucket_count == 0 {
            return Err(FsFormatterError::Invalid(
                "Partition is too small to hold any buckets",
            ));
        }

        let map_sector = start_sector + reserved_rounded as u64;
        Ok(Self {
            geometry,
            start_sector,
            sector_count,
            reserved_sectors: reserved_rounded as u16,
            bucket_size,
            master_sector: start_sector + master_offset,
            master_mirror_sector: map_sector - 1,
            map_sector,
            map_region_sectors,
            bucket_count,
            partition_name,
            partition_flags,
            bootable,
        })
    }

    /// Rebuilds the layout from a VBR and a verified master record.
    pub fn from_disk(
        geometry: Geometry,
        start_sector: u64,
        vbr: &MfsVbr,
        master: &MfsMasterRecord,
        partition_name: String,
    ) -> Self {
        let bytes_per_sector = vbr.bytes_per_sector as u64;
        let bucket_size = vbr.bucket_size;
        let map_size = master.map_size;

        let map_sectors = map_size.div_ceil(bytes_per_sector);
        let map_region_sectors = map_sectors.div_ceil(bucket_size as u64) * bucket_size as u64;

        Self {
            geometry,
            start_sector,
            sector_count: vbr.sector_count,
            reserved_sectors: vbr.reserved_sectors,
            bucket_size,
            master_sector: start_sector + vbr.master_sector,
            master_mirror_sector: start_sector + vbr.master_mirror_sector,
            map_sector: start_sector + master.map_sector,
            map_region_sectors,
            bucket_count: (map_size / MFS_MAP_ENTRY_SIZE as u64) as u32,
            partition_name,
            partition_flags: PartitionFlags::from_bits_truncate(master.partition_flags),
            bootable: vbr.flags & MFS_VBR_FLAG_BOOTABLE != 0,
        }
    }

    #[inline]
    pub fn bucket_size_bytes(&self) -> usize {
        self.bucket_size as usize * self.geometry.bytes_per_sector as usize
    }

    /// Absolute sector of the first sector of `bucket`.
    #[inline]
    pub fn bucket_to_sector(&self, bucket: u32) -> u64 {
        self.map_sector + self.map_region_sectors + bucket as u64 * self.bucket_size as u64
    }
}

/// Determines how many sectors the bucket map needs and how many buckets
/// the remaining heap holds. The two depend on each other, so iterate to a
/// fixpoint like any FAT-style layout computation.
pub fn converge_map_layout(
    bytes_per_sector: u64,
    available_sectors: u64,
    bucket_size: u16,
) -> (u64, u32) {
    assert!(bytes_per_sector != 0 && bucket_size != 0);
    let bucket_size = bucket_size as u64;

    let mut bucket_count = 0u32;
    let mut map_region_sectors = 0u64;

    for _ in 0..32 {
        let map_bytes = bucket_count as u64 * MFS_MAP_ENTRY_SIZE as u64;
        let map_sectors = map_bytes.div_ceil(bytes_per_sector);
        let map_region_new = map_sectors.div_ceil(bucket_size) * bucket_size;

        let heap_sectors = available_sectors.saturating_sub(map_region_sectors);
        let bucket_count_new = (heap_sectors / bucket_size) as u32;

        if bucket_count_new == bucket_count && map_region_new == map_region_sectors {
            break;
        }

        bucket_count = bucket_count_new;
        map_region_sectors = map_region_new;
    }

    (map_region_sectors, bucket_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_64m() -> MfsMeta {
        MfsMeta::for_format(
            Geometry::default(),
            0,
            64 * 1024 * 1024 / 512,
            1,
            "vali".into(),
            PartitionFlags::SYSTEM_DRIVE,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_layout_64m() {
        let meta = meta_64m();
        assert_eq!(meta.bucket_size, 8);
        // one reserved sector rounds up to a single bucket
        assert_eq!(meta.reserved_sectors, 8);
        assert_eq!(meta.master_sector, 1);
        assert_eq!(meta.map_sector, 8);
        assert_eq!(meta.master_mirror_sector, 7);
        assert_eq!(meta.map_region_sectors % meta.bucket_size as u64, 0);
    }

    #[test]
    fn test_layout_accounts_for_map() {
        let meta = meta_64m();
        let heap_sectors = meta.sector_count - meta.reserved_sectors as u64 - meta.map_region_sectors;
        assert_eq!(meta.bucket_count as u64, heap_sectors / meta.bucket_size as u64);

        // the map must have room for one entry per bucket
        let map_capacity =
            meta.map_region_sectors * meta.geometry.bytes_per_sector as u64 / MFS_MAP_ENTRY_SIZE as u64;
        assert!(map_capacity >= meta.bucket_count as u64);

        // the last bucket must end inside the partition
        let last_end = meta.bucket_to_sector(meta.bucket_count - 1) + meta.bucket_size as u64;
        assert!(last_end <= meta.start_sector + meta.sector_count);
    }

    #[test]
    fn test_layout_nonzero_start() {
        let meta = MfsMeta::for_format(
            Geometry::default(),
            2048,
            1024 * 1024,
            1,
            "data".into(),
            PartitionFlags::DATA_DRIVE,
            false,
        )
        .unwrap();

        assert_eq!(meta.master_sector, 2048 + 1);
        assert_eq!(meta.map_sector, 2048 + 8);
        assert_eq!(meta.bucket_to_sector(0), meta.map_sector + meta.map_region_sectors);
    }

    #[test]
    fn test_rejects_tiny_partition() {
        let result = MfsMeta::for_format(
            Geometry::default(),
            0,
            16,
            1,
            "nope".into(),
            PartitionFlags::empty(),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_roundtrip_through_disk_structures() {
        let meta = meta_64m();
        let vbr = MfsVbr::from_meta(&meta);
        let master = MfsMasterRecord::from_meta(&meta, 0, 8, 16, 17, 0x1000);

        let reopened = MfsMeta::from_disk(
            Geometry::default(),
            meta.start_sector,
            &vbr,
            &master,
            meta.partition_name.clone(),
        );

        assert_eq!(reopened.reserved_sectors, meta.reserved_sectors);
        assert_eq!(reopened.bucket_size, meta.bucket_size);
        assert_eq!(reopened.master_sector, meta.master_sector);
        assert_eq!(reopened.master_mirror_sector, meta.master_mirror_sector);
        assert_eq!(reopened.map_sector, meta.map_sector);
    }
}
