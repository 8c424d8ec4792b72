//! # Boot Stage Configuration and Handoff Interface
//!
//! This crate defines the data structures and constants shared between the
//! flash-resident boot stage and the Linux kernel it starts. It is the single
//! source of truth for the boot parameter ABI and the default flash layout.
//!
//! ## Architecture
//!
//! ### Boot Tags ([`tags`])
//! The handoff contract with the next stage:
//! * **Tag List**: a fixed-layout array of `{id, size, data}` records that
//!   starts with `FIRST` and ends with `LAST`
//! * **Command Line Slot**: one pre-sized slot that stays inert (`LAST`) until
//!   a command line is extracted
//! * **Consumer View**: a tag walker that parses the list the way the kernel's
//!   early setup code does
//!
//! ### Flash Layout ([`layout`])
//! Compile-time defaults for partition labels, the anchor mapping and the
//! command-line budget.
//!
//! ### Boot Phase ([`phase`])
//! A forward-only phase value other components (e.g. the IPC task) can read
//! to learn that control transfer is imminent.
//!
//! ## Tag List Layout
//!
//! ```text
//! offset  0  ┌──────────────┬──────────────┐
//!            │ id = FIRST   │ size = 0     │
//! offset  4  ├──────────────┼──────────────┤
//!            │ id = CMDLINE │ size = 260   │   (id = LAST while unused)
//! offset  8  ├──────────────┴──────────────┤
//!            │ command line, NUL padded    │   260 bytes
//! offset 268 ├──────────────┬──────────────┤
//!            │ id = LAST    │ size = 0     │
//! offset 272 └──────────────┴──────────────┘
//! ```
//!
//! A consumer starts at `FIRST` and advances by `4 + size` until it sees
//! `LAST`, so an inert slot ends the walk early and a filled slot leads it
//! straight to the trailing terminator.
//!
//! ## Usage
//!
//! ```rust
//! use boot_info::tags::{BootTagId, BootTagList};
//!
//! let mut tags = BootTagList::new();
//! tags.set_command_line(b"console=ttyS0").unwrap();
//!
//! let ids: Vec<_> = tags.iter().map(|t| t.unwrap().kind()).collect();
//! assert_eq!(ids, [Some(BootTagId::First), Some(BootTagId::CommandLine)]);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod layout;
pub mod phase;
pub mod tags;
