//! # Flash Layout Defaults

/// Bytes reserved for the command line payload, terminator included.
pub const COMMAND_LINE_SIZE: usize = 260;

/// Longest command line that fits the slot (one byte goes to the NUL).
pub const COMMAND_LINE_MAX: usize = COMMAND_LINE_SIZE - 1;

/// Partition holding the kernel image; its mapped address is the entry point.
pub const KERNEL_LABEL: &str = "linux";

/// Partition holding the JFFS2 configuration image.
pub const CONFIG_LABEL: &str = "etc";

/// Partition holding the root filesystem; mapped, never parsed.
pub const ROOTFS_LABEL: &str = "rootfs";

/// Partition mapped first so later mappings can be steered into place.
pub const ANCHOR_LABEL: &str = "factory";

/// Initial mapping size of the anchor partition.
pub const ANCHOR_MAP_SIZE: u32 = 0x4_0000;

/// Inode number of the JFFS2 root directory.
pub const CMDLINE_PARENT_INO: u32 = 1;

/// File name of the command line inside the root directory.
pub const CMDLINE_FILE_NAME: &str = "cmdline";

const _: () = {
    assert!(COMMAND_LINE_SIZE.is_multiple_of(4));
    assert!(COMMAND_LINE_SIZE <= u16::MAX as usize);
    assert!(ANCHOR_MAP_SIZE.is_multiple_of(0x1_0000));
};
