//! In-memory record store for one retrieval session.

use super::record::MeasurementRecord;

/// Append-ordered measurement records.
///
/// Records are kept in arrival order. There is no deduplication and no index
/// by sequence number: sequence filters are evaluated by the device.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordStore {
    records: Vec<MeasurementRecord>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded record.
    pub fn push(&mut self, record: MeasurementRecord) {
        self.records.push(record);
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`, in arrival order.
    pub fn get(&self, index: usize) -> Option<&MeasurementRecord> {
        self.records.get(index)
    }

    /// Most recently appended record.
    pub fn last(&self) -> Option<&MeasurementRecord> {
        self.records.last()
    }

    /// All records as a slice.
    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    /// Iterate in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, MeasurementRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a MeasurementRecord;
    type IntoIter = std::slice::Iter<'a, MeasurementRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
