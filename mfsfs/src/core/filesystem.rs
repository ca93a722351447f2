// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{string::String, vec::Vec};

use uuid::Uuid;

use crate::core::attr::FileFlags;
use crate::core::error::FsResult;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub name: String,
    pub directory: bool,
    pub size: u64,
    pub allocated_size: u64,
}

/// Unified trait representing a filesystem that can populate one partition
/// of a disk image.
///
/// Content operations are only valid once the filesystem has been formatted
/// or opened; `close` must be called exactly once per session to persist
/// allocator state.
pub trait FileSystem {
    /// Formats the partition, writing boot metadata and empty structures.
    fn format(&mut self) -> FsResult;

    /// Lists the contents of `path`, which must resolve to a directory.
    fn list_directory(&mut self, path: &str) -> FsResult<Vec<FsEntry>>;

    /// Creates (or overwrites the contents of) the file at `path`, creating
    /// missing intermediate directories.
    fn create_file(&mut self, path: &str, flags: FileFlags, contents: &[u8]) -> FsResult;

    /// Creates the directory at `path`, creating missing intermediates.
    fn create_directory(&mut self, path: &str, flags: FileFlags) -> FsResult;

    /// Ends the session, flushing allocator state to disk. Further content
    /// operations fail.
    fn close(&mut self) -> FsResult;

    // === Partition descriptors, consumed by the partitioning layer ===

    /// MBR-style partition type id.
    fn type_id(&self) -> u8;

    /// GPT partition type GUID.
    fn type_guid(&self) -> Uuid;

    fn is_bootable(&self) -> bool;

    fn sector_start(&self) -> u64;

    fn sector_count(&self) -> u64;

    fn name(&self) -> &str;
}
