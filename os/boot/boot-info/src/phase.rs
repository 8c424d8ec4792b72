//! # Boot Phase
//!
//! Once the boot stage starts remapping flash, nothing else may touch the
//! cache MMU or service requests that expect the current firmware to keep
//! running. The phase is published here so collaborating tasks can check it
//! instead of sharing an ad hoc flag.

use core::sync::atomic::{AtomicU8, Ordering};

/// Where the boot stage currently is. Phases only ever move forward.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum BootPhase {
    /// Normal firmware operation; the boot stage has not started.
    Running = 0,
    /// Partitions are being located and mapped.
    Mapping = 1,
    /// Control transfer to the next stage is imminent; do not service events.
    Handoff = 2,
}

impl BootPhase {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Mapping,
            _ => Self::Handoff,
        }
    }
}

/// Shared, forward-only phase value.
pub struct BootPhaseCell(AtomicU8);

impl BootPhaseCell {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(BootPhase::Running as u8))
    }

    #[must_use]
    pub fn get(&self) -> BootPhase {
        BootPhase::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next` unless a later phase was already reached.
    /// Returns the phase that was current before the call.
    pub fn advance(&self, next: BootPhase) -> BootPhase {
        BootPhase::from_raw(self.0.fetch_max(next as u8, Ordering::AcqRel))
    }

    /// Whether event handlers should stop servicing requests.
    #[must_use]
    pub fn handoff_imminent(&self) -> bool {
        self.get() == BootPhase::Handoff
    }
}

impl Default for BootPhaseCell {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide boot phase read by the scheduler and IPC handlers.
pub static BOOT_PHASE: BootPhaseCell = BootPhaseCell::new();
