use crate::error::BootError;
use crate::platform::{Label, Partition, PartitionQuery, PartitionTable, PartitionType};

/// Partition lookups on top of a [`PartitionTable`].
pub struct Locator<'t, T: ?Sized> {
    table: &'t T,
}

impl<'t, T: PartitionTable + ?Sized> Locator<'t, T> {
    #[must_use]
    pub const fn new(table: &'t T) -> Self {
        Self { table }
    }

    /// The first partition labelled `label`.
    ///
    /// # Errors
    /// [`BootError::PartitionNotFound`] if there is none.
    pub fn find(&self, label: &str) -> Result<Partition, BootError> {
        self.table
            .find_first(&PartitionQuery::label(label))
            .ok_or_else(|| BootError::PartitionNotFound(Label::new(label)))
    }

    /// The first partition of the given type and subtype; `None` matches any.
    #[must_use]
    pub fn find_typed(
        &self,
        kind: Option<PartitionType>,
        subtype: Option<u8>,
    ) -> Option<Partition> {
        self.table.find_first(&PartitionQuery::typed(kind, subtype))
    }

    /// All partitions, in the table's (ascending address) order.
    ///
    /// The order is trusted here; the range walker rejects violations.
    #[must_use]
    pub fn enumerate(&self) -> T::Partitions<'t> {
        self.table.partitions()
    }
}
