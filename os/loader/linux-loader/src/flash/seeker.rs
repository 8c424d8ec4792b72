use super::mapper::{Mapping, map_partition};
use crate::error::BootError;
use crate::platform::FlashMapper;
use flash_addresses::{PhysicalAddress, Size32M, WindowAlignment};
use log::debug;

/// Grows `last` so that the next mapping lands at the window offset of
/// `target`.
///
/// The MMU fills entries from the lowest free one, so the end of the most
/// recent mapping predicts where the next one starts. If that prediction
/// falls short of `target` the same partition is remapped once, longer by
/// the difference. A prediction past `target` cannot be repaired.
///
/// Returns the mapping to predict from afterwards: `last` itself when no
/// remap was needed.
///
/// # Errors
/// * [`BootError::AlignmentOvershoot`] if `last` already reaches past
///   `target`.
/// * [`BootError::MappingFailure`] if the longer mapping is refused, e.g.
///   because it would exceed the partition.
/// * [`BootError::AlignmentMismatch`] if the longer mapping did not grow in
///   place.
pub fn seek<M: FlashMapper + ?Sized>(
    mapper: &mut M,
    last: &Mapping,
    target: PhysicalAddress,
) -> Result<Mapping, BootError> {
    let overshoot = |excess| BootError::AlignmentOvershoot {
        label: last.partition.label,
        target,
        excess,
    };

    let gap = match last.region.alignment_to::<Size32M, _>(target) {
        Some(WindowAlignment::Aligned) => return Ok(*last),
        Some(WindowAlignment::Overshoot(excess)) => return Err(overshoot(excess)),
        Some(WindowAlignment::Short(gap)) => gap,
        None => return Err(overshoot(u32::MAX)),
    };
    let len = last.len().checked_add(gap).ok_or_else(|| overshoot(u32::MAX))?;

    debug!(
        "extending {} by {gap:#x} to reach {target}",
        last.partition.label
    );
    let grown = map_partition(mapper, &last.partition, len)?;

    match grown.region.alignment_to::<Size32M, _>(target) {
        Some(WindowAlignment::Aligned) => Ok(grown),
        _ => Err(BootError::AlignmentMismatch {
            label: last.partition.label,
            physical: target,
            mapped: grown.base(),
        }),
    }
}
