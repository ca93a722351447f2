// SPDX-License-Identifier: MIT

use bitflags::bitflags;

bitflags! {
    /// Flags applied to an individual file or directory entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FileFlags: u32 {
        const DIRECTORY = 0x1;
        const SYSTEM = 0x2;
    }
}

bitflags! {
    /// Attributes of the filesystem as a whole, supplied by the layout that
    /// owns the partition table. These translate into on-disk partition
    /// flags and the bootable bit of the volume boot record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FsAttributes: u32 {
        const BOOT = 0x1;
        const HIDDEN = 0x2;
        const SYSTEM_DRIVE = 0x4;
        const DATA_DRIVE = 0x8;
        const USER_DRIVE = 0x10;
    }
}
