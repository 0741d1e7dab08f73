//! Partition-counter incremental hierarchy: each essential [`Comparison`]
//! splits records into `(comparison, projected-record)` partitions; a
//! record is dominated once its non-preferred partition has a live
//! preferred-partition counterpart.
//!
//! Ground truth: `operators/updatedata.py::HierarchyPartition`.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::comparison::Comparison;
use crate::hierarchy::arena::RecordArena;
use crate::hierarchy::Hierarchy;
use crate::record::Record;

type PartitionId = (usize, Record);

pub struct HierarchyPartition {
    arena: RecordArena,
    comparisons: Vec<Comparison>,
    pref_count: HashMap<PartitionId, usize>,
    notpref_set: HashMap<PartitionId, HashSet<u64>>,
    pdom_count: HashMap<u64, usize>,
    best_set: HashSet<u64>,
}

fn partition_id(record: &Record, comparison_id: usize, comparison: &Comparison) -> PartitionId {
    let mut projected = record.clone();
    for attr in comparison.indifferent_set() {
        projected.remove(attr);
    }
    (comparison_id, projected)
}

fn dec_count<K: core::hash::Hash + Eq + Clone>(map: &mut HashMap<K, usize>, key: &K) {
    if let Some(v) = map.get_mut(key) {
        if *v <= 1 {
            map.remove(key);
        } else {
            *v -= 1;
        }
    }
}

impl HierarchyPartition {
    #[must_use]
    pub fn new(comparisons: Vec<Comparison>, initial: &[Record]) -> Self {
        let mut h = Self {
            arena: RecordArena::new(),
            comparisons,
            pref_count: HashMap::new(),
            notpref_set: HashMap::new(),
            pdom_count: HashMap::new(),
            best_set: HashSet::new(),
        };
        for record in initial {
            h.add(record);
        }
        h
    }

    fn add(&mut self, record: &Record) {
        let (id, first) = self.arena.add(record);
        if !first {
            return;
        }
        let mut remove_best = HashSet::new();
        let mut dominated = false;
        for (cid, comp) in self.comparisons.iter().enumerate() {
            let pid = partition_id(record, cid, comp);
            if comp.is_best_record(record) {
                let count = self.pref_count.entry(pid.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    if let Some(others) = self.notpref_set.get(&pid) {
                        for &other_id in others {
                            *self.pdom_count.entry(other_id).or_insert(0) += 1;
                            remove_best.insert(other_id);
                        }
                    }
                }
            } else if comp.is_worst_record(record) {
                self.notpref_set.entry(pid.clone()).or_default().insert(id);
                if self.pref_count.contains_key(&pid) {
                    *self.pdom_count.entry(id).or_insert(0) += 1;
                    dominated = true;
                }
            }
        }
        for other_id in remove_best {
            self.best_set.remove(&other_id);
        }
        if !dominated {
            self.best_set.insert(id);
        }
    }

    fn delete(&mut self, record: &Record) {
        let (del_id, removed) = self.arena.delete(record);
        if !removed {
            return;
        }
        for (cid, comp) in self.comparisons.iter().enumerate() {
            let pid = partition_id(record, cid, comp);
            if comp.is_best_record(record) {
                dec_count(&mut self.pref_count, &pid);
                if let Some(others) = self.notpref_set.get(&pid).cloned() {
                    for other_id in others {
                        dec_count(&mut self.pdom_count, &other_id);
                        if !self.pdom_count.contains_key(&other_id) {
                            self.best_set.insert(other_id);
                        }
                    }
                }
            } else if comp.is_worst_record(record) {
                if let Some(set) = self.notpref_set.get_mut(&pid) {
                    set.remove(&del_id);
                    if set.is_empty() {
                        self.notpref_set.remove(&pid);
                    }
                }
            }
        }
    }

    /// One non-dominated-records pass over `id_dict`, consuming those
    /// records from it and decrementing `pref_dict` accordingly.
    ///
    /// Ground truth: `HierarchyPartition._best_records`.
    fn peel_layer(&self, id_dict: &mut HashMap<u64, Record>, pref_dict: &mut HashMap<PartitionId, usize>) -> Vec<Record> {
        let mut result = Vec::new();
        let mut remove_ids = Vec::new();
        for (&id, rec) in id_dict.iter() {
            let dominated = self.comparisons.iter().enumerate().any(|(cid, comp)| {
                comp.is_worst_record(rec) && pref_dict.contains_key(&partition_id(rec, cid, comp))
            });
            if !dominated {
                result.extend(core::iter::repeat(rec.clone()).take(self.arena.count(id)));
                remove_ids.push(id);
            }
        }
        self.remove_id_list(id_dict, pref_dict, &remove_ids);
        result
    }

    fn remove_id_list(
        &self,
        id_dict: &mut HashMap<u64, Record>,
        pref_dict: &mut HashMap<PartitionId, usize>,
        to_remove: &[u64],
    ) {
        for &id in to_remove {
            if let Some(rec) = id_dict.remove(&id) {
                for (cid, comp) in self.comparisons.iter().enumerate() {
                    if comp.is_best_record(&rec) {
                        dec_count(pref_dict, &partition_id(&rec, cid, comp));
                    }
                }
            }
        }
    }
}

impl Hierarchy for HierarchyPartition {
    fn update(&mut self, deleted: &[Record], inserted: &[Record]) {
        for record in deleted {
            self.delete(record);
        }
        for record in inserted {
            self.add(record);
        }
    }

    fn best_records(&self) -> Vec<Record> {
        let mut out = Vec::new();
        for &id in &self.best_set {
            if let Some(rec) = self.arena.record(id) {
                out.extend(core::iter::repeat(rec.clone()).take(self.arena.count(id)));
            }
        }
        out
    }

    fn topk(&self, k: usize) -> Vec<Record> {
        let mut id_dict: HashMap<u64, Record> = self.arena.entries().map(|(id, r)| (id, r.clone())).collect();
        let mut pref_dict = self.pref_count.clone();
        let mut result = self.best_records();
        let to_remove: Vec<u64> = self.best_set.iter().copied().collect();
        self.remove_id_list(&mut id_dict, &mut pref_dict, &to_remove);
        while result.len() < k && !id_dict.is_empty() {
            let layer = self.peel_layer(&mut id_dict, &mut pref_dict);
            if layer.is_empty() {
                break;
            }
            result.extend(layer);
        }
        result.truncate(k);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, DataType};
    use crate::formula::Formula;
    use crate::interval::Interval;
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn rec(v: i64) -> Record {
        let mut r = Record::new();
        r.set(attr("a"), Value::Int(v));
        r
    }

    fn comparisons() -> Vec<Comparison> {
        alloc::vec![Comparison::new(
            Formula::new().with(attr("a"), Interval::one_sided("=", Value::Int(1))),
            Formula::new().with(attr("a"), Interval::one_sided("=", Value::Int(0))),
            HashSet::new(),
        )]
    }

    #[test]
    fn dominated_record_is_excluded_from_best_set() {
        let h = HierarchyPartition::new(comparisons(), &[rec(1), rec(0)]);
        assert_eq!(h.best_records(), alloc::vec![rec(1)]);
    }

    #[test]
    fn topk_peels_dominated_layer() {
        let h = HierarchyPartition::new(comparisons(), &[rec(1), rec(0)]);
        assert_eq!(h.topk(2), alloc::vec![rec(1), rec(0)]);
    }
}
