//! The sequence data model: an ordered run of positions, each carrying a
//! record, its original arrival timestamp, and a `[start, end]` validity
//! window under which it counts as "current".
//!
//! Ground truth: `control/sequence.py::Sequence`.

use alloc::vec::Vec;

use crate::record::Record;

/// One slot of a [`Sequence`]: a record plus its arrival timestamp and
/// the validity window that keeps it in the sequence.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    record: Record,
    timestamp: i64,
    start: i64,
    end: i64,
}

impl Position {
    #[must_use]
    pub const fn new(record: Record, timestamp: i64, start: i64, end: i64) -> Self {
        Self { record, timestamp, start, end }
    }

    #[must_use]
    pub const fn record(&self) -> &Record {
        &self.record
    }

    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub const fn start(&self) -> i64 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> i64 {
        self.end
    }

    #[must_use]
    pub const fn is_valid_at(&self, now: i64) -> bool {
        self.start <= now && now <= self.end
    }
}

/// An ordered run of [`Position`]s with inserted/deleted counters consumed
/// by the incremental `CONSEQ`/`ENDSEQ` operators (§4.7).
///
/// Ground truth: `control/sequence.py::Sequence`.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    identifier: Record,
    positions: Vec<Position>,
    inserted: usize,
    deleted: usize,
}

impl Sequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sequence tagged with the identifier-attribute record that groups
    /// its positions (SEQ's `tup_id`).
    #[must_use]
    pub fn with_identifier(identifier: Record) -> Self {
        Self { identifier, ..Self::default() }
    }

    #[must_use]
    pub const fn identifier(&self) -> &Record {
        &self.identifier
    }

    /// Append a position and bump the inserted counter.
    pub fn append_position(&mut self, record: Record, timestamp: i64, start: i64, end: i64) {
        self.positions.push(Position::new(record, timestamp, start, end));
        self.inserted += 1;
    }

    /// Append every position of `other`, bumping the inserted counter by
    /// its length.
    pub fn append_sequence(&mut self, other: &Self) {
        self.inserted += other.positions.len();
        self.positions.extend(other.positions.iter().cloned());
    }

    /// Drop positions from the front whose validity window has expired
    /// as of `now`, bumping the deleted counter for each.
    pub fn delete_expired_positions(&mut self, now: i64) {
        while let Some(first) = self.positions.first() {
            if first.is_valid_at(now) {
                break;
            }
            self.delete_first(1);
        }
    }

    /// Drop `count` positions from the front, bumping the deleted
    /// counter.
    pub fn delete_first(&mut self, count: usize) {
        let n = count.min(self.positions.len());
        self.positions.drain(0..n);
        self.deleted += n;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn position(&self, index: usize) -> Option<&Record> {
        self.positions.get(index).map(Position::record)
    }

    #[must_use]
    pub fn position_slot(&self, index: usize) -> Option<&Position> {
        self.positions.get(index)
    }

    #[must_use]
    pub fn timestamp(&self, index: usize) -> Option<i64> {
        self.positions.get(index).map(Position::timestamp)
    }

    #[must_use]
    pub fn last_position(&self) -> Option<&Position> {
        self.positions.last()
    }

    #[must_use]
    pub fn first_different_position(&self, other: &Self) -> Option<usize> {
        self.positions
            .iter()
            .zip(other.positions.iter())
            .position(|(a, b)| a != b)
            .or_else(|| {
                if self.positions.len() == other.positions.len() {
                    None
                } else {
                    Some(self.positions.len().min(other.positions.len()))
                }
            })
    }

    #[must_use]
    pub const fn inserted_count(&self) -> usize {
        self.inserted
    }

    #[must_use]
    pub const fn deleted_count(&self) -> usize {
        self.deleted
    }

    pub fn restart_inserted(&mut self) {
        self.inserted = 0;
    }

    pub fn restart_deleted(&mut self) {
        self.deleted = 0;
    }

    /// A contiguous `[start, end)` slice as an independent sequence,
    /// carrying none of the inserted/deleted history.
    #[must_use]
    pub fn subsequence(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.positions.len());
        if start >= end {
            return Self::with_identifier(self.identifier.clone());
        }
        Self {
            identifier: self.identifier.clone(),
            positions: self.positions[start..end].to_vec(),
            inserted: 0,
            deleted: 0,
        }
    }

    /// A deep copy that resets the inserted/deleted counters, as used by
    /// `SeqNode` when it freezes a prefix.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            positions: self.positions.clone(),
            inserted: 0,
            deleted: 0,
        }
    }

    /// Maximal runs of positions whose timestamps are consecutive
    /// integers (`t, t+1, t+2, ...`).
    ///
    /// Ground truth: `Sequence.get_ctsubsequences`.
    #[must_use]
    pub fn ct_subsequences(&self) -> Vec<Self> {
        let mut runs = Vec::new();
        let mut run_start = 0usize;
        for i in 1..self.positions.len() {
            if self.positions[i].timestamp != self.positions[i - 1].timestamp + 1 {
                runs.push(self.subsequence(run_start, i));
                run_start = i;
            }
        }
        if !self.positions.is_empty() {
            runs.push(self.subsequence(run_start, self.positions.len()));
        }
        runs
    }

    /// Every suffix of the sequence, from longest to shortest.
    ///
    /// Ground truth: `Sequence.get_ep_subsequences`.
    #[must_use]
    pub fn ep_subsequences(&self) -> Vec<Self> {
        (0..self.positions.len())
            .map(|start| self.subsequence(start, self.positions.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, DataType};
    use crate::value::Value;

    fn rec(v: i64) -> Record {
        let mut r = Record::new();
        r.set(Attribute::new("x", DataType::Integer), Value::Int(v));
        r
    }

    #[test]
    fn delete_expired_positions_trims_from_front() {
        let mut seq = Sequence::new();
        seq.append_position(rec(1), 0, 0, 0);
        seq.append_position(rec(2), 1, 1, 2);
        seq.delete_expired_positions(1);
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.position(0), Some(&rec(2)));
    }

    #[test]
    fn ct_subsequences_splits_on_timestamp_gaps() {
        let mut seq = Sequence::new();
        seq.append_position(rec(1), 0, 0, 10);
        seq.append_position(rec(2), 1, 0, 10);
        seq.append_position(rec(3), 3, 0, 10);
        let runs = seq.ct_subsequences();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 1);
    }

    #[test]
    fn ep_subsequences_are_decreasing_suffixes() {
        let mut seq = Sequence::new();
        seq.append_position(rec(1), 0, 0, 10);
        seq.append_position(rec(2), 1, 0, 10);
        let suffixes = seq.ep_subsequences();
        assert_eq!(suffixes.len(), 2);
        assert_eq!(suffixes[0].len(), 2);
        assert_eq!(suffixes[1].len(), 1);
    }
}
