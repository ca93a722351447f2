// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::string::{String, ToString};

use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::core::attr::FileFlags;
use crate::core::error::{FsInjectorError, FsInjectorResult};
use crate::fs::mfs::constant::*;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RecordFlags: u32 {
        const IN_USE = 0x1;
        const DIRECTORY = 0x2;
        const SYSTEM = 0x4;
    }
}

impl RecordFlags {
    pub fn from_file_flags(flags: FileFlags) -> Self {
        let mut record_flags = RecordFlags::IN_USE;
        if flags.contains(FileFlags::DIRECTORY) {
            record_flags |= RecordFlags::DIRECTORY;
        }
        if flags.contains(FileFlags::SYSTEM) {
            record_flags |= RecordFlags::SYSTEM;
        }
        record_flags
    }
}

/// On-disk layout of a single directory slot. Directories are arrays of
/// these, packed back to back inside the directory's bucket chain.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone)]
#[repr(C, packed)]
pub struct RecordSlot {
    pub flags: u32,
    pub bucket: u32,
    pub bucket_length: u32,
    pub reserved0: [u8; 36],
    pub size: u64,
    pub allocated_size: u64,
    pub reserved1: [u8; 4],
    pub name: [u8; 300],
    pub reserved2: [u8; 656],
}

impl RecordSlot {
    pub fn is_in_use(&self) -> bool {
        self.flags & RecordFlags::IN_USE.bits() != 0
    }
}

/// A decoded directory record, together with the location of the slot it
/// was read from so it can be written back in place.
#[derive(Debug, Clone, Default)]
pub struct MfsRecord {
    pub name: String,
    pub flags: RecordFlags,
    pub bucket: u32,
    pub bucket_length: u32,
    pub size: u64,
    pub allocated_size: u64,

    /// Head bucket of the run holding this record's slot.
    pub directory_bucket: u32,
    /// Length of that run.
    pub directory_length: u32,
    /// Slot index within the run.
    pub directory_index: u32,
}

impl MfsRecord {
    /// Synthesizes the record for the root directory, which has no slot of
    /// its own anywhere on disk.
    pub fn root(root_bucket: u32, root_length: u32) -> Self {
        Self {
            name: "<root>".to_string(),
            flags: RecordFlags::IN_USE | RecordFlags::DIRECTORY,
            bucket: root_bucket,
            bucket_length: root_length,
            size: 0,
            allocated_size: 0,
            directory_bucket: MFS_END_OF_CHAIN,
            directory_length: 0,
            directory_index: 0,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.flags.contains(RecordFlags::DIRECTORY)
    }

    /// Decodes the slot at `(directory_bucket, directory_index)`. Returns
    /// None for slots that are not in use.
    pub fn decode(
        slot: &RecordSlot,
        directory_bucket: u32,
        directory_length: u32,
        directory_index: u32,
    ) -> Option<Self> {
        if !slot.is_in_use() {
            return None;
        }

        let name_len = slot
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MFS_NAME_CAPACITY);
        let name = String::from_utf8_lossy(&slot.name[..name_len]).into_owned();

        Some(Self {
            name,
            flags: RecordFlags::from_bits_truncate(slot.flags),
            bucket: slot.bucket,
            bucket_length: slot.bucket_length,
            size: slot.size,
            allocated_size: slot.allocated_size,
            directory_bucket,
            directory_length,
            directory_index,
        })
    }

    /// Serializes this record into `slot`, leaving reserved regions intact.
    /// The name must fit the slot including its NUL terminator.
    pub fn encode_into(&self, slot: &mut RecordSlot) -> FsInjectorResult {
        if self.name.len() > MFS_NAME_MAX_LEN {
            return Err(FsInjectorError::NameTooLong);
        }

        slot.flags = self.flags.bits();
        slot.bucket = self.bucket;
        slot.bucket_length = self.bucket_length;
        slot.size = self.size;
        slot.allocated_size = self.allocated_size;

        slot.name = [0u8; MFS_NAME_CAPACITY];
        slot.name[..self.name.len()].copy_from_slice(self.name.as_bytes());
        Ok(())
    }
}
