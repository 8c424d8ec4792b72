//! # Partition Walking
//!
//! Two ways to decide what gets mapped after the anchor:
//!
//! * [`RangeWalker`] maps every partition lying entirely inside a flash
//!   window, in table order.
//! * [`map_sequence`] maps a fixed list of labels, in list order.
//!
//! Both extend the previous mapping with the seeker when a partition starts
//! past the end of the last one, and both hand every fresh mapping to a
//! [`LabelDispatch`], which picks out the kernel and pulls the command line
//! out of the configuration partition.

use crate::cmdline::{self, Extraction};
use crate::config::BootConfig;
use crate::error::BootError;
use crate::flash::{Mapping, map_partition, seek};
use crate::partition::Locator;
use crate::platform::{FlashMapper, Partition, PartitionTable};
use boot_info::tags::BootTagList;
use flash_addresses::{PhysicalAddress, Region};
use log::{debug, info, warn};
use tiny_jffs2::Image;

/// Reacts to partitions by label once they are mapped.
pub struct LabelDispatch<'c, 't> {
    config: &'c BootConfig,
    tags: &'t mut BootTagList,
    kernel: Option<Mapping>,
    extraction: Option<Extraction>,
}

impl<'c, 't> LabelDispatch<'c, 't> {
    #[must_use]
    pub const fn new(config: &'c BootConfig, tags: &'t mut BootTagList) -> Self {
        Self {
            config,
            tags,
            kernel: None,
            extraction: None,
        }
    }

    pub fn on_mapped<M: FlashMapper + ?Sized>(&mut self, mapper: &M, mapping: &Mapping) {
        let label = mapping.partition.label;
        info!("{label} ptr = {}", mapping.base());

        if label.matches(self.config.kernel_label) && self.kernel.is_none() {
            self.kernel = Some(*mapping);
        }

        // One attempt per boot, even if the label shows up twice.
        if label.matches(self.config.config_label) && self.extraction.is_none() {
            let outcome = match mapping.bytes(mapper) {
                Some(bytes) => cmdline::extract(Image::new(bytes), &self.config.cmdline, self.tags),
                None => Extraction::NoFile,
            };
            log_extraction(mapping, &outcome);
            self.extraction = Some(outcome);
        }
    }

    /// The kernel mapping, if the kernel partition was mapped.
    #[must_use]
    pub const fn kernel(&self) -> Option<Mapping> {
        self.kernel
    }

    #[must_use]
    pub const fn extraction(&self) -> Option<Extraction> {
        self.extraction
    }
}

fn log_extraction(mapping: &Mapping, outcome: &Extraction) {
    let label = mapping.partition.label;
    match outcome {
        Extraction::Applied(len) => info!("command line from {label}: {len} bytes"),
        Extraction::NoFile => info!("no command line in {label}"),
        Extraction::Empty => info!("command line in {label} is empty"),
        Extraction::Unreadable(e) => warn!("command line in {label} unreadable: {e}"),
        Extraction::Rejected(e) => warn!("command line in {label} rejected: {e}"),
    }
}

/// What a walk left behind.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WalkSummary {
    /// The most recent mapping; the next one would be predicted from it.
    pub last: Mapping,
    /// Partitions mapped by the walk.
    pub mapped: usize,
    /// End of the last mapped partition, or the window start.
    pub cursor: PhysicalAddress,
}

/// Maps every partition inside `[start, end)` back to back.
///
/// The table must list partitions in ascending address order. Partitions
/// that cross either window edge are skipped, never partially mapped; the
/// first partition at or past the end stops the walk.
///
/// The cursor starts at the window start. A partition beyond the cursor is
/// reached by growing the last mapping; one exactly at the cursor is mapped
/// as is and has to land in place on its own.
pub struct RangeWalker {
    window: Region<PhysicalAddress>,
    cursor: PhysicalAddress,
    last: Mapping,
    mapped: usize,
}

impl RangeWalker {
    /// A walker over `window` whose first mapping is predicted from `anchor`.
    #[must_use]
    pub const fn new(window: Region<PhysicalAddress>, anchor: Mapping) -> Self {
        Self {
            window,
            cursor: window.base(),
            last: anchor,
            mapped: 0,
        }
    }

    /// Walks the table once.
    ///
    /// # Errors
    /// * [`BootError::OutOfOrderPartition`] if a partition inside the window
    ///   starts before the end of one already mapped.
    /// * Anything [`seek`] or [`map_partition`] reports.
    pub fn run<T, M>(
        mut self,
        locator: &Locator<'_, T>,
        mapper: &mut M,
        dispatch: &mut LabelDispatch<'_, '_>,
    ) -> Result<WalkSummary, BootError>
    where
        T: PartitionTable + ?Sized,
        M: FlashMapper + ?Sized,
    {
        let start = self.window.base();
        let end = self
            .window
            .end()
            .unwrap_or_else(|| PhysicalAddress::new(u32::MAX));

        for partition in locator.enumerate() {
            if partition.address < start {
                debug!("{} lies before the window", partition.label);
                continue;
            }
            if partition.address >= end {
                break;
            }
            if partition.address < self.cursor {
                return Err(BootError::OutOfOrderPartition {
                    label: partition.label,
                    address: partition.address,
                    cursor: self.cursor,
                });
            }

            let region = partition.region();
            if !self.window.contains(&region) {
                debug!("{} crosses the window end", partition.label);
                continue;
            }
            if partition.size == 0 {
                continue;
            }

            self.map_next(mapper, &partition, dispatch)?;
            self.cursor = region.end().unwrap_or(end);
        }

        Ok(WalkSummary {
            last: self.last,
            mapped: self.mapped,
            cursor: self.cursor,
        })
    }

    fn map_next<M: FlashMapper + ?Sized>(
        &mut self,
        mapper: &mut M,
        partition: &Partition,
        dispatch: &mut LabelDispatch<'_, '_>,
    ) -> Result<(), BootError> {
        if partition.address > self.cursor {
            seek(mapper, &self.last, partition.address)?;
        }
        let mapping = map_partition(mapper, partition, 0)?;
        dispatch.on_mapped(mapper, &mapping);
        self.last = mapping;
        self.mapped += 1;
        Ok(())
    }
}

/// Maps the partitions named by `labels` in order, starting behind `anchor`.
/// Labels missing from the table are skipped.
///
/// Returns the most recent mapping.
///
/// # Errors
/// Anything [`seek`] or [`map_partition`] reports.
pub fn map_sequence<T, M>(
    locator: &Locator<'_, T>,
    mapper: &mut M,
    labels: &[&str],
    anchor: Mapping,
    dispatch: &mut LabelDispatch<'_, '_>,
) -> Result<Mapping, BootError>
where
    T: PartitionTable + ?Sized,
    M: FlashMapper + ?Sized,
{
    let mut last = anchor;
    for label in labels {
        let partition = match locator.find(label) {
            Ok(partition) => partition,
            Err(e) if !e.is_fatal() => {
                warn!("{e}, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };

        seek(mapper, &last, partition.address)?;
        let mapping = map_partition(mapper, &partition, 0)?;
        dispatch.on_mapped(mapper, &mapping);
        last = mapping;
    }
    Ok(last)
}
