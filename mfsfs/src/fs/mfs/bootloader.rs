// SPDX-License-Identifier: MIT

//! Bootloader installation for bootable partitions.
//!
//! Stage 1 replaces the VBR sector, with the filesystem header bytes
//! carried over from the formatted sector. Stage 2 occupies the reserved
//! sectors between the VBR and the master record.

use std::fs;
use std::path::Path;

use log::info;
use mfsio::prelude::*;

use crate::fs::mfs::constant::*;
use crate::fs::mfs::meta::MfsMeta;
use crate::core::error::{FsFormatterError, FsFormatterResult};

pub fn bootloader_exists(image: &str) -> bool {
    Path::new(image).exists()
}

/// Overwrites the VBR with `stage1_image` and, when given, writes
/// `stage2_image` into the reserved sectors following it. The partition
/// must already be formatted.
pub fn install_bootloaders<IO: DiskIO>(
    io: &mut IO,
    meta: &MfsMeta,
    stage1_image: &str,
    stage2_image: Option<&str>,
) -> FsFormatterResult {
    let bps = io.bytes_per_sector() as usize;

    info!("bootloader: installing stage1 ({stage1_image})");
    let mut stage1 = fs::read(stage1_image).map_err(|_| FsFormatterError::MissingBootloader)?;
    if stage1.len() > bps {
        return Err(FsFormatterError::Invalid(
            "Stage1 image does not fit in one sector",
        ));
    }
    stage1.resize(bps, 0);

    // carry the filesystem header over from the formatted sector; the
    // loader image only has placeholder bytes in that range
    let existing = io.read_sectors_vec(meta.start_sector, 1)?;
    stage1[MFS_VBR_HEADER_START..MFS_VBR_HEADER_END]
        .copy_from_slice(&existing[MFS_VBR_HEADER_START..MFS_VBR_HEADER_END]);
    stage1[8] = MFS_VBR_FLAG_BOOTABLE;

    io.write_sectors(meta.start_sector, &stage1, true)?;

    if let Some(stage2_image) = stage2_image {
        info!("bootloader: installing stage2 ({stage2_image})");
        let mut stage2 = fs::read(stage2_image).map_err(|_| FsFormatterError::MissingBootloader)?;
        let sector_count = stage2.len().div_ceil(bps) as u64;
        if 1 + sector_count > meta.master_sector - meta.start_sector {
            return Err(FsFormatterError::Invalid(
                "Stage2 image overruns the reserved region",
            ));
        }
        stage2.resize(sector_count as usize * bps, 0);
        io.write_sectors(meta.start_sector + 1, &stage2, true)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mfs::formatter::MfsFormatter;
    use crate::fs::mfs::types::boot::PartitionFlags;
    use mfsio::{Geometry, MemDisk};
    use std::io::Write;

    const DISK_BYTES: usize = 64 * 1024 * 1024;

    fn stage_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn formatted_meta(disk: &mut MemDisk<'_>, reserved: u16) -> MfsMeta {
        let meta = MfsMeta::for_format(
            Geometry::default(),
            0,
            (DISK_BYTES / 512) as u64,
            reserved,
            "boot".into(),
            PartitionFlags::SYSTEM_DRIVE,
            true,
        )
        .unwrap();
        MfsFormatter::new(disk, &meta).format().unwrap();
        meta
    }

    #[test]
    fn test_stage1_preserves_header() {
        let mut buffer = vec![0u8; DISK_BYTES];
        let mut disk = MemDisk::new(&mut buffer);
        let meta = formatted_meta(&mut disk, 1);

        let header_before = disk.read_sectors_vec(0, 1).unwrap();

        let stage1 = stage_file(&[0xAA; 512]);
        install_bootloaders(&mut disk, &meta, stage1.path().to_str().unwrap(), None).unwrap();

        let sector = disk.read_sectors_vec(0, 1).unwrap();
        assert_eq!(
            sector[MFS_VBR_HEADER_START..MFS_VBR_HEADER_END],
            header_before[MFS_VBR_HEADER_START..MFS_VBR_HEADER_END]
        );
        assert_eq!(sector[8], MFS_VBR_FLAG_BOOTABLE);
        // loader bytes outside the header survive
        assert_eq!(sector[0], 0xAA);
        assert_eq!(sector[511], 0xAA);
    }

    #[test]
    fn test_missing_stage1_reported() {
        let mut buffer = vec![0u8; DISK_BYTES];
        let mut disk = MemDisk::new(&mut buffer);
        let meta = formatted_meta(&mut disk, 1);

        let result = install_bootloaders(&mut disk, &meta, "/nonexistent/stage1.sys", None);
        assert!(matches!(result, Err(FsFormatterError::MissingBootloader)));
    }

    #[test]
    fn test_stage2_written_after_vbr() {
        let mut buffer = vec![0u8; DISK_BYTES];
        let mut disk = MemDisk::new(&mut buffer);

        // three reserved sectors: VBR plus two for stage2
        let meta = formatted_meta(&mut disk, 3);
        assert_eq!(meta.master_sector, 3);

        let stage1 = stage_file(&[0xAA; 512]);
        let stage2 = stage_file(&[0xBB; 700]);
        install_bootloaders(
            &mut disk,
            &meta,
            stage1.path().to_str().unwrap(),
            Some(stage2.path().to_str().unwrap()),
        )
        .unwrap();

        let sectors = disk.read_sectors_vec(1, 2).unwrap();
        assert_eq!(sectors[0], 0xBB);
        assert_eq!(sectors[699], 0xBB);
        // zero padding up to the sector boundary
        assert_eq!(sectors[700], 0x00);
        assert_eq!(sectors[1023], 0x00);
    }

    #[test]
    fn test_oversized_stage2_rejected() {
        let mut buffer = vec![0u8; DISK_BYTES];
        let mut disk = MemDisk::new(&mut buffer);
        let meta = formatted_meta(&mut disk, 1);

        let stage1 = stage_file(&[0xAA; 512]);
        let stage2 = stage_file(&[0xBB; 4096]);
        let result = install_bootloaders(
            &mut disk,
            &meta,
            stage1.path().to_str().unwrap(),
            Some(stage2.path().to_str().unwrap()),
        );
        assert!(matches!(result, Err(FsFormatterError::Invalid(_))));
    }
}
