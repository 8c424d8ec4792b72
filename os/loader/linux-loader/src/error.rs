use crate::platform::{Label, MapError, StorageError};
use flash_addresses::{PhysicalAddress, VirtualAddress};

/// Why a boot attempt stopped.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BootError {
    #[error("partition {0} not found")]
    PartitionNotFound(Label),
    #[error("mapping {size:#x} bytes of {label} failed: {source}")]
    MappingFailure {
        label: Label,
        size: u32,
        #[source]
        source: MapError,
    },
    #[error("{label} at {physical} landed at {mapped}, window offsets differ")]
    AlignmentMismatch {
        label: Label,
        physical: PhysicalAddress,
        mapped: VirtualAddress,
    },
    #[error("mapping of {label} already reaches {excess:#x} bytes past {target}")]
    AlignmentOvershoot {
        label: Label,
        target: PhysicalAddress,
        excess: u32,
    },
    #[error("{label} at {address} lies behind the walk cursor {cursor}")]
    OutOfOrderPartition {
        label: Label,
        address: PhysicalAddress,
        cursor: PhysicalAddress,
    },
    #[error("priming {label} failed: {source}")]
    StorageFailure {
        label: Label,
        #[source]
        source: StorageError,
    },
    #[error("kernel partition {0} was not mapped")]
    KernelNotFound(Label),
}

impl BootError {
    /// Whether the attempt must be abandoned. Only a missing partition may
    /// be tolerated, and only where the caller decides so.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::PartitionNotFound(_))
    }
}
