// SPDX-License-Identifier: MIT

// === Identity ===

pub const MFS_TYPE: u8 = 0x61; // MBR partition type id
pub const MFS_MAGIC: [u8; 4] = *b"MFS1";
pub const MFS_VERSION: u8 = 0x1;
pub const MFS_MEDIA_TYPE: u8 = 0x80; // fixed disk

// === Volume Boot Record ===

pub const MFS_VBR_JUMP: [u8; 3] = [0xEB, 0x28, 0x90]; // jmp past the header
pub const MFS_VBR_FLAG_BOOTABLE: u8 = 0x1;
/// Byte range of the VBR occupied by the filesystem header. A bootloader
/// image installed over the VBR must leave these bytes intact.
pub const MFS_VBR_HEADER_START: usize = 3;
pub const MFS_VBR_HEADER_END: usize = 44;

// === Master Record ===

pub const MFS_MASTER_RECORD_SIZE: usize = 512;
pub const MFS_CHECKSUM_OFFSET: usize = 8;
pub const MFS_CHECKSUM_SIZE: usize = 4;
pub const MFS_PARTITION_NAME_CAPACITY: usize = 64;

// === Bucket Map ===

/// Chain terminator, also used for "no bucket assigned".
pub const MFS_END_OF_CHAIN: u32 = 0xFFFF_FFFF;
/// Each map entry is a (link, run length) pair of little-endian u32.
pub const MFS_MAP_ENTRY_SIZE: usize = 8;

// === Records ===

pub const MFS_RECORD_SIZE: usize = 1024;
/// Byte capacity of the name field, including the NUL terminator.
pub const MFS_NAME_CAPACITY: usize = 300;
pub const MFS_NAME_MAX_LEN: usize = MFS_NAME_CAPACITY - 1;

// === Format Parameters ===

pub const MFS_ROOT_BUCKETS: u32 = 8;
pub const MFS_JOURNAL_BUCKETS: u32 = 8;
pub const MFS_BAD_LIST_BUCKETS: u32 = 1;
/// Granularity used when growing a directory or file chain.
pub const MFS_EXPAND_BUCKETS: u32 = 8;

// === Bucket Size Thresholds ===

pub const GIGABYTE: u64 = 1024 * 1024 * 1024;

/// Bucket size in sectors for a given partition size in bytes.
pub fn determine_bucket_size(partition_bytes: u64) -> u16 {
    if partition_bytes <= GIGABYTE {
        8
    } else if partition_bytes <= 64 * GIGABYTE {
        16
    } else if partition_bytes <= 256 * GIGABYTE {
        32
    } else {
        64
    }
}
