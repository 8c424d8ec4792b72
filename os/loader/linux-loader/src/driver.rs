//! # Boot Driver
//!
//! Runs one boot attempt from start to finish: map the anchor, map the
//! partitions the layout asks for, fill the boot tags, jump. Every fatal
//! condition ends up here as a [`BootError`] and turns into a restart.

use crate::config::{BootConfig, BootLayout, PrimeRead};
use crate::error::BootError;
use crate::flash::{Mapping, map_partition};
use crate::partition::Locator;
use crate::platform::{FlashMapper, Handoff, Label, PartitionTable, RawStorage};
use crate::tracing::trace_boot_plan;
use crate::walker::{LabelDispatch, RangeWalker, map_sequence};
use boot_info::phase::{BOOT_PHASE, BootPhase, BootPhaseCell};
use boot_info::tags::BootTagList;
use flash_addresses::{Region, VirtualAddress};
use log::{debug, error, info, warn};

/// Stack buffer for priming reads.
const PRIME_CHUNK: usize = 256;

/// Everything needed to enter the kernel.
#[derive(Debug)]
pub struct BootPlan {
    pub entry: VirtualAddress,
    pub kernel: Mapping,
    pub tags: BootTagList,
    /// The most recent mapping made.
    pub last: Mapping,
}

/// One boot attempt over the platform services.
pub struct BootStage<'p, T: ?Sized, M: ?Sized, S: ?Sized> {
    config: BootConfig,
    table: &'p T,
    mapper: &'p mut M,
    storage: &'p mut S,
    phase: &'p BootPhaseCell,
}

impl<'p, T, M, S> BootStage<'p, T, M, S>
where
    T: PartitionTable + ?Sized,
    M: FlashMapper + ?Sized,
    S: RawStorage + ?Sized,
{
    /// A stage publishing its progress in the global [`BOOT_PHASE`].
    #[must_use]
    pub fn new(config: BootConfig, table: &'p T, mapper: &'p mut M, storage: &'p mut S) -> Self {
        Self {
            config,
            table,
            mapper,
            storage,
            phase: &BOOT_PHASE,
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: &'p BootPhaseCell) -> Self {
        self.phase = phase;
        self
    }

    /// Maps everything and builds the boot tags, without leaving the stage.
    ///
    /// # Errors
    /// * [`BootError::PartitionNotFound`] if the anchor is missing.
    /// * [`BootError::KernelNotFound`] if the layout never mapped the kernel.
    /// * Anything the mapper, seeker, walker or priming read reports.
    pub fn prepare(&mut self) -> Result<BootPlan, BootError> {
        self.phase.advance(BootPhase::Mapping);
        let config = self.config;
        let locator = Locator::new(self.table);

        if let Some(prime) = config.prime {
            self.prime(&locator, &prime)?;
        }

        let anchor = locator.find(config.anchor.label)?;
        let anchor = map_partition(self.mapper, &anchor, config.anchor.size)?;

        let mut tags = BootTagList::new();
        let mut dispatch = LabelDispatch::new(&config, &mut tags);
        dispatch.on_mapped(self.mapper, &anchor);

        let last = match config.layout {
            BootLayout::Named(labels) => {
                map_sequence(&locator, self.mapper, labels, anchor, &mut dispatch)?
            }
            BootLayout::Window { start, .. } => {
                let window = config.window().unwrap_or_else(|| {
                    warn!("window ends before {start}, nothing to map");
                    Region::new(start, 0)
                });
                RangeWalker::new(window, anchor)
                    .run(&locator, self.mapper, &mut dispatch)?
                    .last
            }
        };

        let kernel = dispatch
            .kernel()
            .ok_or_else(|| BootError::KernelNotFound(Label::new(config.kernel_label)))?;

        Ok(BootPlan {
            entry: kernel.base(),
            kernel,
            tags,
            last,
        })
    }

    /// Runs the attempt and leaves through `handoff`: into the kernel on
    /// success, into a restart otherwise.
    pub fn run<H: Handoff + ?Sized>(mut self, handoff: &mut H) -> ! {
        match self.prepare() {
            Ok(plan) => {
                trace_boot_plan(&plan);
                self.phase.advance(BootPhase::Handoff);
                info!("entering kernel at {}", plan.entry);
                handoff.enter(plan.entry, &plan.tags)
            }
            Err(e) => {
                error!("boot failed: {e}");
                handoff.restart()
            }
        }
    }

    /// Reads `prime.len` bytes through the flash driver. A missing partition
    /// only skips the read.
    fn prime(&mut self, locator: &Locator<'_, T>, prime: &PrimeRead) -> Result<(), BootError> {
        let partition = match locator.find(prime.label) {
            Ok(partition) => partition,
            Err(e) => {
                warn!("{e}, not priming");
                return Ok(());
            }
        };

        let mut buf = [0u8; PRIME_CHUNK];
        let mut done = 0;
        while done < prime.len {
            let len = PRIME_CHUNK.min(prime.len - done);
            let offset = u32::try_from(done)
                .ok()
                .and_then(|done| prime.offset.checked_add(done))
                .unwrap_or(u32::MAX);
            self.storage
                .read(&partition, offset, &mut buf[..len])
                .map_err(|source| BootError::StorageFailure {
                    label: partition.label,
                    source,
                })?;
            done += len;
        }

        debug!("primed {done:#x} bytes of {}", partition.label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StorageError;
    use crate::sim::{PanicHandoff, SimMmu, SimStorage, SimTable, stock_mmu, stock_partitions};
    use flash_addresses::PhysicalAddress;

    fn stage_parts(cmdline: Option<&[u8]>) -> (SimTable, SimMmu, SimStorage) {
        let mmu = stock_mmu(cmdline);
        let storage = SimStorage::new(&mmu.flash);
        (SimTable::new(stock_partitions()), mmu, storage)
    }

    #[test]
    fn stock_layout_boots_linux() {
        let (table, mut mmu, mut storage) = stage_parts(Some(b"console=ttyS0"));
        let phase = BootPhaseCell::new();

        let plan = BootStage::new(BootConfig::default(), &table, &mut mmu, &mut storage)
            .with_phase(&phase)
            .prepare()
            .unwrap();

        assert_eq!(phase.get(), BootPhase::Mapping);
        assert_eq!(plan.entry, VirtualAddress::new(0x4212_0000));
        assert!(plan.last.partition.label.matches("rootfs"));
        assert_eq!(plan.tags.command_line(), Some(&b"console=ttyS0"[..]));

        let requests: Vec<(Label, u32)> = mmu.requests.iter().map(|r| (r.0, r.2)).collect();
        assert_eq!(
            requests,
            vec![
                (Label::new("factory"), 0x4_0000),
                (Label::new("factory"), 0x10_0000),
                (Label::new("etc"), 0x1_0000),
                (Label::new("linux"), 0x20_0000),
                (Label::new("rootfs"), 0x8_0000),
            ]
        );
        assert!(storage.reads.is_empty());
    }

    #[test]
    fn window_layout_matches_the_stock_sequence() {
        let (table, mut mmu, mut storage) = stage_parts(None);
        let config = BootConfig::new()
            .with_window(PhysicalAddress::new(0x10_0000), PhysicalAddress::new(0x3A_0000));

        let plan = BootStage::new(config, &table, &mut mmu, &mut storage)
            .with_phase(&BootPhaseCell::new())
            .prepare()
            .unwrap();

        assert_eq!(plan.entry, VirtualAddress::new(0x4212_0000));
        assert_eq!(plan.tags.command_line(), None);
        assert_eq!(plan.tags.slots().command_line, BootTagList::new().slots().command_line);
        assert_eq!(mmu.requests.len(), 5);
    }

    #[test]
    fn missing_anchor_fails_before_mapping() {
        let (_, mut mmu, mut storage) = stage_parts(None);
        let table = SimTable::new(stock_partitions().split_off(2));

        let err = BootStage::new(BootConfig::new(), &table, &mut mmu, &mut storage)
            .with_phase(&BootPhaseCell::new())
            .prepare()
            .unwrap_err();

        assert_eq!(err, BootError::PartitionNotFound(Label::new("factory")));
        assert!(mmu.requests.is_empty());
    }

    #[test]
    fn layouts_without_the_kernel_fail() {
        let (table, mut mmu, mut storage) = stage_parts(None);
        let err = BootStage::new(
            BootConfig::new().with_sequence(&["etc"]),
            &table,
            &mut mmu,
            &mut storage,
        )
        .with_phase(&BootPhaseCell::new())
        .prepare()
        .unwrap_err();
        assert_eq!(err, BootError::KernelNotFound(Label::new("linux")));

        let (table, mut mmu, mut storage) = stage_parts(None);
        let inverted = BootConfig::new()
            .with_window(PhysicalAddress::new(0x3A_0000), PhysicalAddress::new(0x11_0000));
        let err = BootStage::new(inverted, &table, &mut mmu, &mut storage)
            .with_phase(&BootPhaseCell::new())
            .prepare()
            .unwrap_err();
        assert_eq!(err, BootError::KernelNotFound(Label::new("linux")));
        assert_eq!(mmu.requests.len(), 1);
    }

    #[test]
    fn prime_reads_in_chunks() {
        let (table, mut mmu, mut storage) = stage_parts(None);
        let config = BootConfig::new().with_prime("nvs", 0x10, 0x180);

        BootStage::new(config, &table, &mut mmu, &mut storage)
            .with_phase(&BootPhaseCell::new())
            .prepare()
            .unwrap();

        assert_eq!(
            storage.reads,
            vec![(Label::new("nvs"), 0x10, 0x100), (Label::new("nvs"), 0x110, 0x80)]
        );
    }

    #[test]
    fn prime_of_missing_partition_is_skipped() {
        let (table, mut mmu, mut storage) = stage_parts(None);
        let config = BootConfig::new().with_prime("phy_init", 0, 0x10);

        let plan = BootStage::new(config, &table, &mut mmu, &mut storage)
            .with_phase(&BootPhaseCell::new())
            .prepare();

        assert!(plan.is_ok());
        assert!(storage.reads.is_empty());
    }

    #[test]
    fn prime_failure_is_fatal() {
        let (table, mut mmu, mut storage) = stage_parts(None);
        storage.fail = Some(StorageError::Driver(-1));
        let config = BootConfig::new().with_prime("nvs", 0, 0x10);

        let err = BootStage::new(config, &table, &mut mmu, &mut storage)
            .with_phase(&BootPhaseCell::new())
            .prepare()
            .unwrap_err();

        assert_eq!(
            err,
            BootError::StorageFailure {
                label: Label::new("nvs"),
                source: StorageError::Driver(-1),
            }
        );
        assert!(err.is_fatal());
        assert!(mmu.requests.is_empty());
    }

    #[test]
    #[should_panic(expected = "enter 0x42120000 cmdline=Some(\"console=ttyS0\")")]
    fn run_enters_the_kernel() {
        let (table, mut mmu, mut storage) = stage_parts(Some(b"console=ttyS0"));
        BootStage::new(BootConfig::new(), &table, &mut mmu, &mut storage)
            .with_phase(&BootPhaseCell::new())
            .run(&mut PanicHandoff);
    }

    #[test]
    #[should_panic(expected = "restart")]
    fn run_restarts_on_failure() {
        let (table, mut mmu, mut storage) = stage_parts(None);
        mmu.fail_at = Some((2, crate::platform::MapError::Service(-1)));
        BootStage::new(BootConfig::new(), &table, &mut mmu, &mut storage)
            .with_phase(&BootPhaseCell::new())
            .run(&mut PanicHandoff);
    }

    struct PhaseProbe<'a>(&'a BootPhaseCell);

    impl Handoff for PhaseProbe<'_> {
        fn enter(&mut self, _: VirtualAddress, _: &BootTagList) -> ! {
            panic!("entered during {:?}", self.0.get())
        }

        fn restart(&mut self) -> ! {
            panic!("restart")
        }
    }

    #[test]
    #[should_panic(expected = "entered during Handoff")]
    fn phase_reaches_handoff_before_entry() {
        let (table, mut mmu, mut storage) = stage_parts(None);
        let phase = BootPhaseCell::new();
        BootStage::new(BootConfig::new(), &table, &mut mmu, &mut storage)
            .with_phase(&phase)
            .run(&mut PhaseProbe(&phase));
    }
}
