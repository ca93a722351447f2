// SPDX-License-Identifier: MIT

use mfsfs::mfs::*;
use uuid::Uuid;
use zerocopy::FromBytes;

const SIZE_MB: u64 = 64;
const SIZE_BYTES: usize = (SIZE_MB * 1024 * 1024) as usize;
const SECTOR_COUNT: u64 = SIZE_BYTES as u64 / 512;

fn system_fs<'a>(buf: &'a mut [u8]) -> MfsFileSystem<MemDisk<'a>> {
    let disk = MemDisk::new(buf);
    let mut fs = MfsFileSystem::new(
        "vali-system",
        Uuid::from_u128(0xC4483A10_E3A0_4D3F_B7CC_C04A6E16CCE8),
        FsAttributes::SYSTEM_DRIVE,
    );
    fs.initialize(disk, 0, SECTOR_COUNT, None, None)
        .expect("initialize failed");
    fs.format().expect("format failed");
    fs
}

#[test]
fn test_format_writes_expected_image() {
    let mut buf = vec![0u8; SIZE_BYTES];
    let mut fs = system_fs(&mut buf);

    // root (8) + journal (8) + bad-list (1) buckets are allocated up front
    assert_eq!(fs.next_free_bucket(), Some(17));

    fs.close().expect("close failed");
    drop(fs);

    // VBR header
    assert_eq!(&buf[3..7], b"MFS1");
    assert_eq!(buf[7], 1); // version
    assert_eq!(buf[8], 0); // not bootable
    assert_eq!(&buf[10..12], &512u16.to_le_bytes());
    assert_eq!(&buf[16..24], &SECTOR_COUNT.to_le_bytes());
    assert_eq!(&buf[26..28], &8u16.to_le_bytes()); // bucket size for 64 MiB

    // master record at sector 1, mirror on the last reserved sector
    let master = MfsMasterRecord::read_from_bytes(&buf[512..1024]).unwrap();
    assert!(master.verify_checksum());
    let free = master.free_bucket;
    assert_eq!(free, 17);
    assert_eq!(&buf[512..1024], &buf[7 * 512..8 * 512]);
}

#[test]
fn test_file_tree_roundtrip() {
    let mut buf = vec![0u8; SIZE_BYTES];
    let mut fs = system_fs(&mut buf);

    let kernel: Vec<u8> = (0..100_000u32).map(|i| (i % 241) as u8).collect();
    fs.create_file("/boot/kernel.img", FileFlags::SYSTEM, &kernel)
        .expect("create_file failed");
    fs.create_file("/boot/grub/menu.cfg", FileFlags::empty(), b"timeout=0\n")
        .expect("create_file failed");
    fs.create_directory("/logs", FileFlags::empty())
        .expect("create_directory failed");

    assert_eq!(fs.read_file("/boot/kernel.img").unwrap(), kernel);
    assert_eq!(fs.read_file("boot/grub/menu.cfg").unwrap(), b"timeout=0\n");

    let root = fs.list_directory("/").unwrap();
    let names: Vec<_> = root.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"boot"));
    assert!(names.contains(&"logs"));

    let boot = fs.list_directory("/boot").unwrap();
    let kernel_entry = boot.iter().find(|e| e.name == "kernel.img").unwrap();
    assert!(!kernel_entry.directory);
    assert_eq!(kernel_entry.size, kernel.len() as u64);
    // allocations happen in whole buckets (8 sectors of 512 bytes)
    assert_eq!(kernel_entry.allocated_size % 4096, 0);
    assert!(kernel_entry.allocated_size >= kernel_entry.size);

    assert!(boot.iter().any(|e| e.name == "grub" && e.directory));
}

#[test]
fn test_name_length_limits() {
    use mfsfs::fs::mfs::constant::MFS_NAME_MAX_LEN;

    let mut buf = vec![0u8; SIZE_BYTES];
    let mut fs = system_fs(&mut buf);

    let longest = "n".repeat(MFS_NAME_MAX_LEN);
    let path = format!("/{longest}");
    fs.create_file(&path, FileFlags::empty(), b"payload")
        .expect("create_file failed");
    assert_eq!(fs.read_file(&path).unwrap(), b"payload");

    let root = fs.list_directory("/").unwrap();
    assert!(root.iter().any(|e| e.name == longest));

    // one byte over leaves no room for the NUL terminator
    let too_long = format!("/{}", "n".repeat(MFS_NAME_MAX_LEN + 1));
    assert!(fs.create_file(&too_long, FileFlags::empty(), b"x").is_err());
}

#[test]
fn test_missing_paths_reported() {
    let mut buf = vec![0u8; SIZE_BYTES];
    let mut fs = system_fs(&mut buf);

    assert!(fs.read_file("/no/such/file").is_err());
    assert!(fs.list_directory("/absent").is_err());

    // a file used as a directory component must not resolve
    fs.create_file("/file.txt", FileFlags::empty(), b"x").unwrap();
    assert!(fs.read_file("/file.txt/child").is_err());
}

#[test]
fn test_overwrite_keeps_chain_consistent() {
    let mut buf = vec![0u8; SIZE_BYTES];
    let mut fs = system_fs(&mut buf);

    fs.create_file("/data.bin", FileFlags::empty(), b"short")
        .unwrap();
    let bigger: Vec<u8> = (0..20_000u32).map(|i| (i % 13) as u8).collect();
    fs.create_file("/data.bin", FileFlags::empty(), &bigger)
        .unwrap();

    assert_eq!(fs.read_file("/data.bin").unwrap(), bigger);
    let root = fs.list_directory("/").unwrap();
    assert_eq!(root.iter().filter(|e| e.name == "data.bin").count(), 1);
}

#[test]
fn test_close_persists_and_reopens() {
    let mut buf = vec![0u8; SIZE_BYTES];

    let cursor;
    {
        let mut fs = system_fs(&mut buf);
        fs.create_file("/boot/kernel.img", FileFlags::SYSTEM, &[0xC3; 9000])
            .unwrap();
        cursor = fs.next_free_bucket().unwrap();
        fs.close().expect("close failed");
    }

    let disk = MemDisk::new(&mut buf);
    let mut fs = MfsFileSystem::new("ignored", Uuid::nil(), FsAttributes::empty());
    fs.open(disk, 0).expect("open failed");

    assert_eq!(fs.name(), "vali-system");
    assert_eq!(fs.next_free_bucket(), Some(cursor));
    assert_eq!(fs.read_file("/boot/kernel.img").unwrap(), vec![0xC3; 9000]);

    // new allocations continue from the persisted cursor
    fs.create_file("/extra.bin", FileFlags::empty(), &[1; 100])
        .unwrap();
    assert!(fs.next_free_bucket().unwrap() > cursor);
    fs.close().unwrap();
}

#[test]
fn test_session_lifecycle_enforced() {
    let mut buf = vec![0u8; SIZE_BYTES];

    let mut fs: MfsFileSystem<MemDisk<'_>> =
        MfsFileSystem::new("detached", Uuid::nil(), FsAttributes::empty());
    assert!(matches!(
        fs.create_file("/x", FileFlags::empty(), b""),
        Err(FsError::NotReady)
    ));
    assert!(matches!(fs.format(), Err(FsError::NotReady)));

    let mut fs = system_fs(&mut buf);
    fs.close().unwrap();
    assert!(matches!(
        fs.create_file("/x", FileFlags::empty(), b""),
        Err(FsError::Closed)
    ));
    assert!(matches!(fs.close(), Err(FsError::Closed)));
}

#[test]
fn test_partition_descriptors() {
    let mut buf = vec![0u8; SIZE_BYTES];
    let guid = Uuid::from_u128(0x0102_0304);
    let disk = MemDisk::new(&mut buf);

    let mut fs = MfsFileSystem::new("desc", guid, FsAttributes::SYSTEM_DRIVE);
    fs.initialize(disk, 0, SECTOR_COUNT, None, None).unwrap();

    let fs: &mut dyn FileSystem = &mut fs;
    assert_eq!(fs.type_id(), 0x61);
    assert_eq!(fs.type_guid(), guid);
    assert!(!fs.is_bootable());
    assert_eq!(fs.sector_start(), 0);
    assert_eq!(fs.sector_count(), SECTOR_COUNT);
    assert_eq!(fs.name(), "desc");
}
