//! Batching of variable-length records.
//!
//! A batch keeps images and records as two parallel sequences. Records keep
//! their own object counts; padding or stacking is left to the consumer.

use crate::ir::DetectionRecord;

/// `N` images paired with `N` records, in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchUnit<I> {
    images: Vec<I>,
    records: Vec<DetectionRecord>,
}

impl<I> BatchUnit<I> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn images(&self) -> &[I] {
        &self.images
    }

    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = (&I, &DetectionRecord)> {
        self.images.iter().zip(&self.records)
    }

    /// Splits the batch back into its two sequences.
    pub fn into_parts(self) -> (Vec<I>, Vec<DetectionRecord>) {
        (self.images, self.records)
    }

    pub fn into_pairs(self) -> Vec<(I, DetectionRecord)> {
        self.images.into_iter().zip(self.records).collect()
    }

    /// Objects across all records.
    pub fn total_objects(&self) -> usize {
        self.records.iter().map(DetectionRecord::len).sum()
    }

    /// Largest per-record object count; the padding length a dense consumer needs.
    pub fn max_objects(&self) -> usize {
        self.records
            .iter()
            .map(DetectionRecord::len)
            .max()
            .unwrap_or(0)
    }
}

/// Unzips `(image, record)` pairs into a [`BatchUnit`].
pub fn collate<I>(samples: impl IntoIterator<Item = (I, DetectionRecord)>) -> BatchUnit<I> {
    let (images, records) = samples.into_iter().unzip();
    BatchUnit { images, records }
}
