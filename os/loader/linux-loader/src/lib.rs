//! # Flash-Resident Linux Loader
//!
//! The last firmware stage before Linux. It runs straight from flash, makes
//! the Linux partitions visible through the flash MMU, pulls the kernel
//! command line out of a small JFFS2 configuration image and jumps into the
//! kernel with a boot tag list describing that command line.
//!
//! ## Boot Process
//!
//! ```text
//! Firmware task
//!         ↓
//! ┌─────────────────────────────────────────────┐
//! │              Linux Loader                   │
//! ├─────────────────────────────────────────────┤
//! │  1. Preparation                             │
//! │     • Publish the Mapping boot phase        │
//! │     • Optionally prime a partition          │
//! │  2. Anchor                                  │
//! │     • Map the first 256 KiB of factory      │
//! │  3. Partition Mapping                       │
//! │     • Named sequence: etc, linux, rootfs    │
//! │       or every partition inside a window    │
//! │     • Grow the previous mapping until the   │
//! │       next one lands right behind it        │
//! │  4. Configuration                           │
//! │     • Read /cmdline from the etc image      │
//! │     • Fill the command line boot tag        │
//! │  5. Handoff                                 │
//! │     • Publish the Handoff boot phase        │
//! │     • Jump to the mapped linux partition    │
//! └─────────────────────────────────────────────┘
//!         ↓
//! Linux (execute in place)
//! ```
//!
//! Any fatal error on the way is logged and ends in a restart.
//!
//! ## The Mapping Window
//!
//! The flash MMU decides where a mapping lands, but preserves the flash
//! offset modulo 32 MiB. Execute-in-place Linux expects `linux` and
//! `rootfs` to sit back to back at their flash distance, so each mapping
//! must start where the previous one ended. The loader cannot ask for an
//! address; it can only make the previous mapping longer until the MMU's
//! next free entry is the right one. See [`flash`].
//!
//! ## Key Components
//!
//! * [`platform`]: traits for the partition table, flash MMU, raw flash
//!   reads and the final jump
//! * [`partition`]: partition lookups
//! * [`flash`]: mapping plus the alignment seeker
//! * [`walker`]: named and windowed mapping strategies, label dispatch
//! * [`cmdline`]: command line extraction into the boot tags
//! * [`driver`]: one boot attempt, restart on failure
//!
//! ## Usage
//!
//! ```rust,ignore
//! use linux_loader::{BootConfig, BootStage};
//!
//! let mut mmu = RomMmu;
//! let mut flash = SpiFlash;
//! BootStage::new(BootConfig::default(), &ROM_PARTITIONS, &mut mmu, &mut flash)
//!     .run(&mut XtensaHandoff)
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod cmdline;
pub mod config;
pub mod driver;
pub mod error;
pub mod flash;
pub mod partition;
pub mod platform;
mod tracing;
pub mod walker;

#[cfg(test)]
mod sim;

pub use config::{BootConfig, BootLayout};
pub use driver::{BootPlan, BootStage};
pub use error::BootError;
pub use platform::{FlashMapper, Handoff, Partition, PartitionTable, RawStorage};
