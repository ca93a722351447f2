// SPDX-License-Identifier: MIT

use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::core::attr::FsAttributes;
use crate::core::utils::checksum_utils::additive_checksum_skip;
use crate::fs::mfs::{constant::*, meta::MfsMeta};

bitflags! {
    /// Partition flags stored in the master record. Only the low 16 bits of
    /// the on-disk field are defined.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PartitionFlags: u16 {
        const SYSTEM_DRIVE = 0x1;
        const DATA_DRIVE = 0x2;
        const USER_DRIVE = 0x4;
        const HIDDEN = 0x8;
    }
}

impl PartitionFlags {
    pub fn from_attributes(attributes: FsAttributes) -> Self {
        let mut flags = PartitionFlags::empty();
        if attributes.contains(FsAttributes::SYSTEM_DRIVE) {
            flags |= PartitionFlags::SYSTEM_DRIVE;
        }
        if attributes.contains(FsAttributes::DATA_DRIVE) {
            flags |= PartitionFlags::DATA_DRIVE;
        }
        if attributes.contains(FsAttributes::USER_DRIVE) {
            flags |= PartitionFlags::USER_DRIVE;
        }
        if attributes.contains(FsAttributes::HIDDEN) {
            flags |= PartitionFlags::HIDDEN;
        }
        flags
    }
}

/// Filesystem header at the start of the volume boot record. Sector offsets
/// in here are relative to the start of the partition. The remainder of the
/// VBR sector belongs to the stage-1 bootloader.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct MfsVbr {
    pub jump_code: [u8; 3],
    pub magic: [u8; 4],
    pub version: u8,
    pub flags: u8,
    pub media_type: u8,
    pub bytes_per_sector: u16,
    pub sectors_per_track: u16,
    pub heads_per_cylinder: u16,
    pub sector_count: u64,
    pub reserved_sectors: u16,
    pub bucket_size: u16,
    pub master_sector: u64,
    pub master_mirror_sector: u64,
}

impl MfsVbr {
    pub fn from_meta(meta: &MfsMeta) -> Self {
        Self {
            jump_code: MFS_VBR_JUMP,
            magic: MFS_MAGIC,
            version: MFS_VERSION,
            flags: if meta.bootable { MFS_VBR_FLAG_BOOTABLE } else { 0 },
            media_type: MFS_MEDIA_TYPE,
            bytes_per_sector: meta.geometry.bytes_per_sector,
            sectors_per_track: meta.geometry.sectors_per_track,
            heads_per_cylinder: meta.geometry.heads_per_cylinder,
            sector_count: meta.sector_count,
            reserved_sectors: meta.reserved_sectors,
            bucket_size: meta.bucket_size,
            master_sector: meta.master_sector - meta.start_sector,
            master_mirror_sector: meta.master_mirror_sector - meta.start_sector,
        }
    }
}

/// Primary filesystem descriptor, written identically to the master record
/// sector and its mirror. Everything the driver needs to mount lives here.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone)]
#[repr(C, packed)]
pub struct MfsMasterRecord {
    pub magic: [u8; 4],
    pub partition_flags: u16,
    pub reserved0: u16,
    pub checksum: u32,
    pub partition_name: [u8; 64],
    pub free_bucket: u32,
    pub root_bucket: u32,
    pub bad_bucket: u32,
    pub journal_bucket: u32,
    pub map_sector: u64,
    pub map_size: u64,
    pub reserved1: [u8; 404],
}

impl MfsMasterRecord {
    pub fn from_meta(
        meta: &MfsMeta,
        root_bucket: u32,
        journal_bucket: u32,
        bad_bucket: u32,
        free_bucket: u32,
        map_size: u64,
    ) -> Self {
        let mut partition_name = [0u8; MFS_PARTITION_NAME_CAPACITY];
        for (i, b) in meta
            .partition_name
            .bytes()
            .take(MFS_PARTITION_NAME_CAPACITY)
            .enumerate()
        {
            partition_name[i] = b;
        }

        let mut record = Self {
            magic: MFS_MAGIC,
            partition_flags: meta.partition_flags.bits(),
            reserved0: 0,
            checksum: 0,
            partition_name,
            free_bucket,
            root_bucket,
            bad_bucket,
            journal_bucket,
            map_sector: meta.map_sector - meta.start_sector,
            map_size,
            reserved1: [0u8; 404],
        };
        record.fill_checksum();
        record
    }

    /// Additive byte sum over the serialized record, excluding the checksum
    /// field itself.
    pub fn compute_checksum(&self) -> u32 {
        additive_checksum_skip(self.as_bytes(), MFS_CHECKSUM_OFFSET, MFS_CHECKSUM_SIZE)
    }

    pub fn fill_checksum(&mut self) {
        self.checksum = self.compute_checksum();
    }

    pub fn verify_checksum(&self) -> bool {
        let stored = self.checksum;
        stored == self.compute_checksum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;

    #[test]
    fn test_struct_sizes() {
        assert_eq!(size_of::<MfsVbr>(), 44);
        assert_eq!(size_of::<MfsMasterRecord>(), MFS_MASTER_RECORD_SIZE);
    }

    #[test]
    fn test_vbr_field_offsets() {
        let mut vbr = MfsVbr::read_from_bytes(&[0u8; 44]).unwrap();
        vbr.magic = MFS_MAGIC;
        vbr.bytes_per_sector = 512;
        vbr.sector_count = 0x1122_3344_5566_7788;
        vbr.reserved_sectors = 0xAABB;
        vbr.bucket_size = 8;
        vbr.master_sector = 1;
        vbr.master_mirror_sector = 7;

        let bytes = vbr.as_bytes();
        assert_eq!(&bytes[3..7], b"MFS1");
        assert_eq!(&bytes[10..12], &512u16.to_le_bytes());
        assert_eq!(&bytes[16..24], &0x1122_3344_5566_7788u64.to_le_bytes());
        assert_eq!(&bytes[24..26], &0xAABBu16.to_le_bytes());
        assert_eq!(&bytes[26..28], &8u16.to_le_bytes());
        assert_eq!(&bytes[28..36], &1u64.to_le_bytes());
        assert_eq!(&bytes[36..44], &7u64.to_le_bytes());
    }

    #[test]
    fn test_master_record_field_offsets() {
        let mut master = MfsMasterRecord::read_from_bytes(&[0u8; 512]).unwrap();
        master.magic = MFS_MAGIC;
        master.partition_flags = PartitionFlags::SYSTEM_DRIVE.bits();
        master.free_bucket = 17;
        master.root_bucket = 0;
        master.bad_bucket = 16;
        master.journal_bucket = 8;
        master.map_sector = 8;
        master.map_size = 0x1000;

        let bytes = master.as_bytes();
        assert_eq!(&bytes[0..4], b"MFS1");
        assert_eq!(&bytes[4..6], &1u16.to_le_bytes());
        assert_eq!(&bytes[76..80], &17u32.to_le_bytes());
        assert_eq!(&bytes[80..84], &0u32.to_le_bytes());
        assert_eq!(&bytes[84..88], &16u32.to_le_bytes());
        assert_eq!(&bytes[88..92], &8u32.to_le_bytes());
        assert_eq!(&bytes[92..100], &8u64.to_le_bytes());
        assert_eq!(&bytes[100..108], &0x1000u64.to_le_bytes());
    }

    #[test]
    fn test_checksum_skips_itself() {
        let mut master = MfsMasterRecord::read_from_bytes(&[0u8; 512]).unwrap();
        master.magic = MFS_MAGIC;
        master.root_bucket = 0xDEAD;
        master.fill_checksum();
        assert!(master.verify_checksum());

        // corrupting any covered byte must break verification
        master.partition_name[0] = b'x';
        assert!(!master.verify_checksum());

        // restoring and re-filling must converge again
        master.fill_checksum();
        assert!(master.verify_checksum());
    }

    #[test]
    fn test_partition_flags_from_attributes() {
        let flags = PartitionFlags::from_attributes(
            FsAttributes::SYSTEM_DRIVE | FsAttributes::HIDDEN | FsAttributes::BOOT,
        );
        assert_eq!(
            flags,
            PartitionFlags::SYSTEM_DRIVE | PartitionFlags::HIDDEN
        );
    }
}
