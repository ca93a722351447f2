// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use log::{info, warn};
use mfsio::prelude::*;
use uuid::Uuid;

use crate::core::attr::{FileFlags, FsAttributes};
use crate::core::error::{FsError, FsFormatterError, FsResult};
use crate::core::filesystem::{FileSystem, FsEntry};
use crate::fs::mfs::allocator::BucketMap;
use crate::fs::mfs::constant::*;
use crate::fs::mfs::formatter::MfsFormatter;
use crate::fs::mfs::injector::MfsInjector;
use crate::fs::mfs::meta::MfsMeta;
use crate::fs::mfs::resolver::MfsResolver;
use crate::fs::mfs::types::boot::{MfsMasterRecord, MfsVbr, PartitionFlags};
use crate::fs::mfs::types::record::{MfsRecord, RecordFlags};

enum State<D: DiskIO> {
    Detached,
    Initialized {
        disk: D,
        start_sector: u64,
        sector_count: u64,
        reserved_sectors: u16,
    },
    Ready {
        disk: D,
        meta: MfsMeta,
        map: BucketMap,
        root_bucket: u32,
    },
    Closed,
}

/// MFS session over one partition of a disk image.
///
/// The lifecycle is `new` then either `initialize` + `format` (fresh
/// partition) or `open` (existing one), followed by content operations and
/// exactly one `close`, which persists the allocator cursor into both
/// master record copies.
pub struct MfsFileSystem<D: DiskIO> {
    name: String,
    type_guid: Uuid,
    attributes: FsAttributes,
    vbr_image: Option<String>,
    reserved_image: Option<String>,
    state: State<D>,
}

impl<D: DiskIO> MfsFileSystem<D> {
    pub fn new(name: &str, type_guid: Uuid, attributes: FsAttributes) -> Self {
        Self {
            name: name.to_string(),
            type_guid,
            attributes,
            vbr_image: None,
            reserved_image: None,
            state: State::Detached,
        }
    }

    /// Attaches a disk region for a fresh format. `vbr_image` and
    /// `reserved_image` are the stage-1 and stage-2 bootloader images;
    /// the reserved region is sized to fit stage 2.
    pub fn initialize(
        &mut self,
        disk: D,
        start_sector: u64,
        sector_count: u64,
        vbr_image: Option<&str>,
        reserved_image: Option<&str>,
    ) -> FsResult {
        // one sector for the VBR, plus room for the stage-2 image
        let mut reserved_sectors: u16 = 1;
        if let Some(image) = reserved_image {
            reserved_sectors += self.reserved_image_sectors(&disk, image)?;
        }

        self.vbr_image = vbr_image.map(ToString::to_string);
        self.reserved_image = reserved_image.map(ToString::to_string);
        self.state = State::Initialized {
            disk,
            start_sector,
            sector_count,
            reserved_sectors,
        };
        Ok(())
    }

    #[cfg(feature = "std")]
    fn reserved_image_sectors(&self, disk: &D, image: &str) -> FsResult<u16> {
        let len = std::fs::metadata(image)
            .map_err(|_| FsError::Formatter(FsFormatterError::MissingBootloader))?
            .len();
        Ok(len.div_ceil(disk.geometry().bytes_per_sector as u64) as u16)
    }

    #[cfg(not(feature = "std"))]
    fn reserved_image_sectors(&self, _disk: &D, _image: &str) -> FsResult<u16> {
        Err(FsError::IO(DiskIOError::Unsupported))
    }

    /// Formats the attached region and leaves the session ready for
    /// content operations.
    pub fn format(&mut self) -> FsResult {
        let bootable = self.attributes.contains(FsAttributes::BOOT);
        if bootable && !self.stage1_present() {
            return Err(FsError::Formatter(FsFormatterError::MissingBootloader));
        }

        let state = core::mem::replace(&mut self.state, State::Detached);
        let (mut disk, start_sector, sector_count, reserved_sectors) = match state {
            State::Initialized {
                disk,
                start_sector,
                sector_count,
                reserved_sectors,
            } => (disk, start_sector, sector_count, reserved_sectors),
            other => {
                self.state = other;
                return Err(FsError::NotReady);
            }
        };

        let meta = MfsMeta::for_format(
            disk.geometry(),
            start_sector,
            sector_count,
            reserved_sectors,
            self.name.clone(),
            PartitionFlags::from_attributes(self.attributes),
            bootable,
        )?;

        let outcome = MfsFormatter::new(&mut disk, &meta).format()?;

        #[cfg(feature = "std")]
        if bootable {
            if let Some(vbr_image) = &self.vbr_image {
                crate::fs::mfs::bootloader::install_bootloaders(
                    &mut disk,
                    &meta,
                    vbr_image,
                    self.reserved_image.as_deref(),
                )?;
            }
        }

        self.state = State::Ready {
            disk,
            meta,
            map: outcome.map,
            root_bucket: outcome.root_bucket,
        };
        Ok(())
    }

    #[cfg(feature = "std")]
    fn stage1_present(&self) -> bool {
        self.vbr_image
            .as_deref()
            .is_some_and(crate::fs::mfs::bootloader::bootloader_exists)
    }

    #[cfg(not(feature = "std"))]
    fn stage1_present(&self) -> bool {
        false
    }

    /// Mounts an already formatted partition starting at `start_sector`.
    pub fn open(&mut self, mut disk: D, start_sector: u64) -> FsResult {
        let bps = disk.geometry().bytes_per_sector as u64;

        let vbr: MfsVbr = disk.read_struct(start_sector * bps)?;
        if vbr.magic != MFS_MAGIC {
            return Err(FsError::Other("Not an MFS partition"));
        }
        if vbr.version != MFS_VERSION {
            return Err(FsError::Other("Unsupported MFS version"));
        }

        let master_sector = start_sector + vbr.master_sector;
        let master: MfsMasterRecord = disk.read_struct(master_sector * bps)?;
        if master.magic != MFS_MAGIC {
            return Err(FsError::Other("Master record magic mismatch"));
        }
        if !master.verify_checksum() {
            warn!("open: master record checksum mismatch");
            return Err(FsError::Other("Master record checksum mismatch"));
        }

        let name = decode_partition_name(&master.partition_name);
        let meta = MfsMeta::from_disk(disk.geometry(), start_sector, &vbr, &master, name);
        let map = BucketMap::open(&meta, master.free_bucket);

        info!(
            "open: partition '{}', {} buckets, free cursor {}",
            meta.partition_name,
            meta.bucket_count,
            map.next_free_bucket()
        );

        self.name = meta.partition_name.clone();
        self.state = State::Ready {
            disk,
            meta,
            map,
            root_bucket: master.root_bucket,
        };
        Ok(())
    }

    fn ready_mut(&mut self) -> FsResult<(&mut D, &MfsMeta, &mut BucketMap, u32)> {
        match &mut self.state {
            State::Ready {
                disk,
                meta,
                map,
                root_bucket,
            } => Ok((disk, meta, map, *root_bucket)),
            State::Closed => Err(FsError::Closed),
            _ => Err(FsError::NotReady),
        }
    }

    /// Creates (or overwrites) the file at `path` with `contents`,
    /// creating missing parent directories along the way.
    pub fn create_file(&mut self, path: &str, flags: FileFlags, contents: &[u8]) -> FsResult {
        let (disk, meta, map, root_bucket) = self.ready_mut()?;
        let mut injector = MfsInjector::new(disk, map, meta, root_bucket);

        let record_flags = RecordFlags::from_file_flags(flags - FileFlags::DIRECTORY);
        let mut record = injector.create_path(path, record_flags)?;
        if record.is_directory() {
            return Err(FsError::Other("Path resolves to a directory"));
        }

        injector.ensure_bucket_space(&mut record, contents.len() as u64)?;
        record.size = contents.len() as u64;
        injector.write_record(&record)?;
        injector.fill_bucket_chain(&record, contents)?;

        info!("create_file: '{path}' ({} bytes)", contents.len());
        Ok(())
    }

    /// Creates the directory at `path`, including missing parents.
    pub fn create_directory(&mut self, path: &str, flags: FileFlags) -> FsResult {
        let (disk, meta, map, root_bucket) = self.ready_mut()?;
        let mut injector = MfsInjector::new(disk, map, meta, root_bucket);

        let record_flags = RecordFlags::from_file_flags(flags | FileFlags::DIRECTORY);
        let record = injector.create_path(path, record_flags)?;
        if !record.is_directory() {
            return Err(FsError::Other("Path resolves to a file"));
        }
        Ok(())
    }

    /// Lists the directory at `path`.
    pub fn list_directory(&mut self, path: &str) -> FsResult<Vec<FsEntry>> {
        let (disk, meta, map, root_bucket) = self.ready_mut()?;
        let mut resolver = MfsResolver::new(disk, map, meta, root_bucket);

        let records = resolver.list_path(path)?;
        Ok(records.iter().map(to_entry).collect())
    }

    /// Reads back the full contents of the file at `path`.
    pub fn read_file(&mut self, path: &str) -> FsResult<Vec<u8>> {
        let (disk, meta, map, root_bucket) = self.ready_mut()?;
        let mut resolver = MfsResolver::new(disk, map, meta, root_bucket);
        Ok(resolver.read_path(path)?)
    }

    /// Flushes the allocator cursor into both master record copies and
    /// ends the session.
    pub fn close(&mut self) -> FsResult {
        {
            let (disk, meta, map, _) = self.ready_mut()?;
            let bps = meta.geometry.bytes_per_sector as u64;

            for sector in [meta.master_sector, meta.master_mirror_sector] {
                let mut master: MfsMasterRecord = disk.read_struct(sector * bps)?;
                master.free_bucket = map.next_free_bucket();
                master.fill_checksum();
                disk.write_struct(sector * bps, &master)?;
            }
            disk.flush()?;

            info!(
                "close: partition '{}', free cursor {}",
                meta.partition_name,
                map.next_free_bucket()
            );
        }

        self.state = State::Closed;
        Ok(())
    }

    /// Allocator cursor of the live session. Mostly useful for
    /// diagnostics and tests.
    pub fn next_free_bucket(&self) -> Option<u32> {
        match &self.state {
            State::Ready { map, .. } => Some(map.next_free_bucket()),
            _ => None,
        }
    }
}

fn decode_partition_name(raw: &[u8]) -> String {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..len]).into_owned()
}

fn to_entry(record: &MfsRecord) -> FsEntry {
    FsEntry {
        name: record.name.clone(),
        directory: record.is_directory(),
        size: record.size,
        allocated_size: record.allocated_size,
    }
}

impl<D: DiskIO> FileSystem for MfsFileSystem<D> {
    fn format(&mut self) -> FsResult {
        MfsFileSystem::format(self)
    }

    fn list_directory(&mut self, path: &str) -> FsResult<Vec<FsEntry>> {
        MfsFileSystem::list_directory(self, path)
    }

    fn create_file(&mut self, path: &str, flags: FileFlags, contents: &[u8]) -> FsResult {
        MfsFileSystem::create_file(self, path, flags, contents)
    }

    fn create_directory(&mut self, path: &str, flags: FileFlags) -> FsResult {
        MfsFileSystem::create_directory(self, path, flags)
    }

    fn close(&mut self) -> FsResult {
        MfsFileSystem::close(self)
    }

    fn type_id(&self) -> u8 {
        MFS_TYPE
    }

    fn type_guid(&self) -> Uuid {
        self.type_guid
    }

    fn is_bootable(&self) -> bool {
        self.attributes.contains(FsAttributes::BOOT)
    }

    fn sector_start(&self) -> u64 {
        match &self.state {
            State::Initialized { start_sector, .. } => *start_sector,
            State::Ready { meta, .. } => meta.start_sector,
            _ => 0,
        }
    }

    fn sector_count(&self) -> u64 {
        match &self.state {
            State::Initialized { sector_count, .. } => *sector_count,
            State::Ready { meta, .. } => meta.sector_count,
            _ => 0,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
