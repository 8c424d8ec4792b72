//! # Boot Configuration
//!
//! Which partitions get mapped, in what order, and where the command line
//! comes from. Defaults reproduce the stock flash layout: map the first
//! `0x40000` bytes of `factory`, then `etc`, `linux` and `rootfs` back to back.

use boot_info::layout::{
    ANCHOR_LABEL, ANCHOR_MAP_SIZE, CMDLINE_FILE_NAME, CMDLINE_PARENT_INO, CONFIG_LABEL,
    KERNEL_LABEL, ROOTFS_LABEL,
};
use flash_addresses::{PhysicalAddress, Region};
use tiny_jffs2::Ino;

/// Labels mapped after the anchor in the named layout.
pub const DEFAULT_SEQUENCE: &[&str] = &[CONFIG_LABEL, KERNEL_LABEL, ROOTFS_LABEL];

/// How partitions are chosen for mapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BootLayout {
    /// Map the listed partitions in order. Labels missing from the table are
    /// skipped with a warning.
    Named(&'static [&'static str]),
    /// Map every partition that lies entirely inside the flash window
    /// `[start, end)`, in address order.
    Window {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
}

/// Partition the mapping sequence starts from. Its mapping is the one the
/// alignment seeker extends to reach the first partition of the layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Anchor {
    pub label: &'static str,
    /// Bytes mapped initially; `0` maps the whole partition.
    pub size: u32,
}

/// A raw read issued once before mapping starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PrimeRead {
    pub label: &'static str,
    pub offset: u32,
    pub len: usize,
}

/// Location of the command line file inside the configuration image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CommandLineSource {
    pub parent: Ino,
    pub name: &'static str,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootConfig {
    pub layout: BootLayout,
    pub anchor: Anchor,
    /// Partition whose mapped address is the kernel entry point.
    pub kernel_label: &'static str,
    /// Partition holding the JFFS2 configuration image.
    pub config_label: &'static str,
    pub prime: Option<PrimeRead>,
    pub cmdline: CommandLineSource,
}

impl BootConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layout: BootLayout::Named(DEFAULT_SEQUENCE),
            anchor: Anchor {
                label: ANCHOR_LABEL,
                size: ANCHOR_MAP_SIZE,
            },
            kernel_label: KERNEL_LABEL,
            config_label: CONFIG_LABEL,
            prime: None,
            cmdline: CommandLineSource {
                parent: CMDLINE_PARENT_INO,
                name: CMDLINE_FILE_NAME,
            },
        }
    }

    /// Switches to the window layout over `[start, end)`.
    #[must_use]
    pub const fn with_window(mut self, start: PhysicalAddress, end: PhysicalAddress) -> Self {
        self.layout = BootLayout::Window { start, end };
        self
    }

    #[must_use]
    pub const fn with_sequence(mut self, labels: &'static [&'static str]) -> Self {
        self.layout = BootLayout::Named(labels);
        self
    }

    #[must_use]
    pub const fn with_anchor(mut self, label: &'static str, size: u32) -> Self {
        self.anchor = Anchor { label, size };
        self
    }

    #[must_use]
    pub const fn with_prime(mut self, label: &'static str, offset: u32, len: usize) -> Self {
        self.prime = Some(PrimeRead { label, offset, len });
        self
    }

    /// The window of a [`BootLayout::Window`] layout. `None` for the named
    /// layout or if `end` precedes `start`.
    #[must_use]
    pub fn window(&self) -> Option<Region<PhysicalAddress>> {
        match self.layout {
            BootLayout::Window { start, end } => {
                let len = end.as_memory().checked_distance_from(start.as_memory())?;
                Some(Region::new(start, len))
            }
            BootLayout::Named(_) => None,
        }
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::new()
    }
}
