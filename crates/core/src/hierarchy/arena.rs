//! Refcounted record-id arena shared by every incremental hierarchy.
//!
//! Ground truth: `operators/updatedata.py::Hierarchy`'s `_id_dict` /
//! `_tuple_id_dict` / `_count_dict` triple.

use hashbrown::HashMap;

use crate::record::Record;

/// Interns records behind small integer ids and refcounts duplicate
/// inserts, so that a hierarchy's per-id bookkeeping (levels, partition
/// membership, successor edges) need not be recomputed when the same
/// record tuple is seen again.
#[derive(Debug, Clone, Default)]
pub struct RecordArena {
    next_id: u64,
    by_id: HashMap<u64, Record>,
    by_record: HashMap<Record, u64>,
    counts: HashMap<u64, usize>,
}

impl RecordArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `record`, returning its id and whether this is the id's
    /// first occurrence (count went `0 -> 1`).
    pub fn add(&mut self, record: &Record) -> (u64, bool) {
        if let Some(&id) = self.by_record.get(record) {
            *self.counts.get_mut(&id).expect("interned id has a counter") += 1;
            (id, false)
        } else {
            let id = self.next_id;
            self.next_id += 1;
            self.by_record.insert(record.clone(), id);
            self.by_id.insert(id, record.clone());
            self.counts.insert(id, 1);
            (id, true)
        }
    }

    /// Decrements `record`'s refcount, returning its id and whether the
    /// count hit zero (the id is now fully removed from the arena).
    pub fn delete(&mut self, record: &Record) -> (u64, bool) {
        let id = *self.by_record.get(record).expect("deleting an unknown record");
        let count = self.counts.get_mut(&id).expect("interned id has a counter");
        *count -= 1;
        if *count == 0 {
            self.by_record.remove(record);
            self.by_id.remove(&id);
            self.counts.remove(&id);
            (id, true)
        } else {
            (id, false)
        }
    }

    #[must_use]
    pub fn record(&self, id: u64) -> Option<&Record> {
        self.by_id.get(&id)
    }

    #[must_use]
    pub fn count(&self, id: u64) -> usize {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.by_id.keys().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (u64, &Record)> {
        self.by_id.iter().map(|(&id, rec)| (id, rec))
    }
}
