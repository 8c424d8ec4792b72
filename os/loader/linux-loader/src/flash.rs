//! # Flash Mapping
//!
//! Partitions become visible through the flash MMU one mapping at a time.
//! The MMU picks where a mapping lands, but keeps the low 25 bits of the
//! flash offset (the 32 MiB window offset). Two consecutive partitions are
//! therefore contiguous in the address space only if the earlier mapping
//! ends exactly where the window offset of the next partition begins.
//!
//! * [`mapper`]: one mapping plus the window post-condition.
//! * [`seeker`]: grows the previous mapping until the next one lines up.

pub mod mapper;
pub mod seeker;

pub use mapper::{Mapping, map_partition};
pub use seeker::seek;
