#![cfg(feature = "pack")]

use tiny_jffs2::pack::{DirentSpec, ImageBuilder, InodeSpec};
use tiny_jffs2::{ERASE_BLOCK_SIZE, Image, ROOT_INO, ReadError};

fn cmdline_image() -> Vec<u8> {
    ImageBuilder::new()
        .dirent(DirentSpec::new(ROOT_INO, 1, 5, b"cmdline"))
        .unwrap()
        .inode(InodeSpec::new(5, 1).data(b"console=ttyS0"))
        .build()
}

#[test]
fn end_to_end_cmdline() {
    let bytes = cmdline_image();
    let image = Image::new(&bytes);

    assert_eq!(image.lookup(ROOT_INO, b"cmdline"), Some(5));

    let mut buf = [0xAAu8; 64];
    assert_eq!(image.read(5, &mut buf), Ok(13));
    assert_eq!(&buf[..13], b"console=ttyS0");
    assert_eq!(buf[13..], [0u8; 51]);
}

#[test]
fn lookup_prefers_greatest_version() {
    let bytes = ImageBuilder::new()
        .dirent(DirentSpec::new(1, 2, 10, b"cmdline"))
        .unwrap()
        .dirent(DirentSpec::new(1, 7, 12, b"cmdline"))
        .unwrap()
        .dirent(DirentSpec::new(1, 4, 11, b"cmdline"))
        .unwrap()
        .dirent(DirentSpec::new(2, 9, 13, b"cmdline"))
        .unwrap()
        .dirent(DirentSpec::new(1, 9, 14, b"cmdlinex"))
        .unwrap()
        .build();
    let image = Image::new(&bytes);

    assert_eq!(image.lookup(1, b"cmdline"), Some(12));
    assert_eq!(image.lookup(2, b"cmdline"), Some(13));
    assert_eq!(image.lookup(1, b"cmd"), None);
    assert_eq!(image.lookup(3, b"cmdline"), None);
}

#[test]
fn lookup_skips_version_zero_entries() {
    let bytes = ImageBuilder::new()
        .dirent(DirentSpec::new(1, 0, 9, b"cmdline"))
        .unwrap()
        .build();
    assert_eq!(Image::new(&bytes).lookup(1, b"cmdline"), None);

    let bytes = ImageBuilder::new()
        .dirent(DirentSpec::new(1, 0, 9, b"cmdline"))
        .unwrap()
        .dirent(DirentSpec::new(1, 1, 5, b"cmdline"))
        .unwrap()
        .build();
    assert_eq!(Image::new(&bytes).lookup(1, b"cmdline"), Some(5));
}

#[test]
fn lookup_honours_unlink() {
    let bytes = ImageBuilder::new()
        .dirent(DirentSpec::new(1, 1, 5, b"cmdline"))
        .unwrap()
        .dirent(DirentSpec::new(1, 2, 0, b"cmdline"))
        .unwrap()
        .build();
    assert_eq!(Image::new(&bytes).lookup(1, b"cmdline"), None);
}

#[test]
fn truncation_to_zero_becomes_baseline() {
    let bytes = ImageBuilder::new()
        .inode(InodeSpec::new(5, 3).data(b"old contents"))
        .inode(InodeSpec::new(5, 5).offset(4).data(b"CONT"))
        .inode(InodeSpec::new(5, 7).isize(0))
        .build();

    let mut buf = [0xAAu8; 16];
    assert_eq!(Image::new(&bytes).read(5, &mut buf), Ok(0));
    assert_eq!(buf, [0u8; 16]);
}

#[test]
fn single_record_is_zero_padded_to_capacity() {
    let bytes = ImageBuilder::new()
        .inode(InodeSpec::new(7, 1).isize(8).data(b"abc"))
        .build();

    let mut buf = [0xAAu8; 16];
    assert_eq!(Image::new(&bytes).read(7, &mut buf), Ok(8));
    assert_eq!(&buf[..8], b"abc\0\0\0\0\0");
    assert_eq!(buf[8..], [0u8; 8]);
}

#[test]
fn output_is_capped_by_capacity() {
    let bytes = cmdline_image();
    let mut buf = [0u8; 7];
    assert_eq!(Image::new(&bytes).read(5, &mut buf), Ok(7));
    assert_eq!(&buf, b"console");
}

#[test]
fn missing_inode_is_reported() {
    let bytes = cmdline_image();
    let mut buf = [0u8; 8];
    assert_eq!(
        Image::new(&bytes).read(6, &mut buf),
        Err(ReadError::InodeNotFound(6))
    );
}

#[test]
fn nodes_after_garbage_are_found_in_next_erase_block() {
    let bytes = ImageBuilder::new()
        .raw(b"not a node header")
        .pad_to_erase_block()
        .dirent(DirentSpec::new(1, 1, 5, b"cmdline"))
        .unwrap()
        .pad_to_erase_block()
        .inode(InodeSpec::new(5, 1).data(b"quiet"))
        .build();
    let image = Image::new(&bytes);

    let offsets: Vec<_> = image.nodes().map(|n| n.offset).collect();
    assert_eq!(offsets, [ERASE_BLOCK_SIZE, 2 * ERASE_BLOCK_SIZE]);

    let ino = image.lookup(1, b"cmdline").unwrap();
    let mut buf = [0u8; 8];
    let len = image.read(ino, &mut buf).unwrap();
    assert_eq!(&buf[..len], b"quiet");
}

#[test]
fn empty_and_tiny_images_hold_nothing() {
    let mut buf = [0u8; 4];
    for bytes in [&[][..], &[0x85, 0x19, 0x01][..], &[0xFF; 11][..]] {
        let image = Image::new(bytes);
        assert_eq!(image.nodes().count(), 0);
        assert_eq!(image.lookup(1, b"cmdline"), None);
        assert_eq!(image.read(5, &mut buf), Err(ReadError::InodeNotFound(5)));
    }
}
