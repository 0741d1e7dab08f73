//! `PreferenceOp`: drives one of five best/top-k algorithms over the
//! operand's current record list at each tick.
//!
//! Ground truth: `operators/simplepreference.py::PreferenceOp`.

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::attribute::Attribute;
use crate::comparison::Comparison;
use crate::hierarchy::{Hierarchy, HierarchyAncestors, HierarchyGraph, HierarchyPartition};
use crate::operator::{Operator, OperatorState, ResultKind};
use crate::record::Record;
use crate::theory::CpTheory;

/// Which of the five best/top-k strategies `PreferenceOp` drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceAlgorithm {
    /// Recursive pairwise dominance partition, recomputed from scratch
    /// every tick.
    DepthSearch,
    /// Essential-comparison partitioning, recomputed from scratch every
    /// tick.
    Partition,
    /// `HierarchyAncestors`, maintained incrementally.
    IncAncestors,
    /// `HierarchyPartition`, maintained incrementally.
    IncPartition,
    /// `HierarchyGraph`, maintained incrementally.
    IncGraph,
}

pub struct PreferenceOp<Op> {
    operand: Op,
    cptheory: CpTheory,
    algorithm: PreferenceAlgorithm,
    top: i64,
    hierarchy: Option<Box<dyn Hierarchy>>,
    state: OperatorState,
}

impl<Op: Operator> PreferenceOp<Op> {
    /// `top == 0` emits nothing every tick; `top > 0` requests a top-k
    /// list; any other negative value requests the dominant (best) set.
    #[must_use]
    pub fn new(operand: Op, cptheory: CpTheory, algorithm: PreferenceAlgorithm, top: i64) -> Self {
        Self { operand, cptheory, algorithm, top, hierarchy: None, state: OperatorState::new() }
    }

    fn ensure_hierarchy(&mut self) -> &mut dyn Hierarchy {
        if self.hierarchy.is_none() {
            let initial = self.operand.get_current_list();
            let built: Box<dyn Hierarchy> = match self.algorithm {
                PreferenceAlgorithm::IncAncestors => Box::new(HierarchyAncestors::new(self.cptheory.clone(), initial)),
                PreferenceAlgorithm::IncPartition => {
                    Box::new(HierarchyPartition::new(self.cptheory.comparisons().to_vec(), initial))
                }
                PreferenceAlgorithm::IncGraph => Box::new(HierarchyGraph::new(self.cptheory.clone(), initial)),
                PreferenceAlgorithm::DepthSearch | PreferenceAlgorithm::Partition => unreachable!("non-incremental algorithm"),
            };
            self.hierarchy = Some(built);
        }
        self.hierarchy.as_deref_mut().expect("just populated")
    }

    fn update_hierarchy(&mut self) {
        let deleted = self.operand.get_deleted_list();
        let inserted = self.operand.get_inserted_list();
        self.ensure_hierarchy().update(&deleted, &inserted);
    }

    pub fn run(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        let current = if self.top == 0 {
            Vec::new()
        } else if self.top > 0 {
            let k = self.top as usize;
            match self.algorithm {
                PreferenceAlgorithm::DepthSearch => get_topk_search(&self.cptheory, self.operand.get_current_list().to_vec(), k),
                PreferenceAlgorithm::Partition => get_topk_partition(&self.cptheory, self.operand.get_current_list().to_vec(), k),
                _ => {
                    self.update_hierarchy();
                    self.hierarchy.as_ref().expect("ensured above").topk(k)
                }
            }
        } else {
            match self.algorithm {
                PreferenceAlgorithm::DepthSearch => get_best_search(&self.cptheory, self.operand.get_current_list().to_vec()),
                PreferenceAlgorithm::Partition => get_best_partition(&self.cptheory, self.operand.get_current_list().to_vec()),
                _ => {
                    self.update_hierarchy();
                    self.hierarchy.as_ref().expect("ensured above").best_records()
                }
            }
        };
        tracing::debug!(timestamp, top = self.top, kept = current.len(), "PreferenceOp tick");
        self.state.set_current(current);
    }
}

impl<Op: Operator> Operator for PreferenceOp<Op> {
    fn state(&self) -> &OperatorState {
        &self.state
    }

    fn get_attribute_list(&self) -> &[Attribute] {
        self.operand.get_attribute_list()
    }

    fn get_result_type(&self) -> ResultKind {
        ResultKind::Stream
    }

    fn is_consistent(&self) -> bool {
        self.operand.is_consistent()
    }
}

/// Pairwise dominance partition of a record list, mirroring the
/// pop-and-compare loop in `_get_dominant_and_dominated`.
fn dominant_and_dominated(theory: &CpTheory, mut record_list: Vec<Record>) -> (Vec<Record>, Vec<Record>) {
    let mut worst_list = Vec::new();
    let mut best_list = Vec::new();
    while let Some(rec) = record_list.pop() {
        let mut incomparable = Vec::new();
        let mut dominated = false;
        while let Some(other) = record_list.pop() {
            if theory.dominates(&other, &rec) {
                dominated = true;
                worst_list.push(rec.clone());
                incomparable.push(other);
                break;
            } else if theory.dominates(&rec, &other) {
                worst_list.push(other);
            } else {
                incomparable.push(other);
            }
        }
        record_list.extend(incomparable);
        if !dominated {
            best_list.push(rec);
        }
    }
    (best_list, worst_list)
}

fn get_best_search(theory: &CpTheory, records: Vec<Record>) -> Vec<Record> {
    dominant_and_dominated(theory, records).0
}

fn get_topk_search(theory: &CpTheory, records: Vec<Record>, top: usize) -> Vec<Record> {
    let mut dominated_list = records;
    let mut topk = Vec::new();
    while topk.len() < top && !dominated_list.is_empty() {
        let (dominant, rest) = dominant_and_dominated(theory, dominated_list);
        dominated_list = rest;
        topk.extend(dominant);
    }
    topk.truncate(top);
    topk
}

fn best_direct(records: Vec<Record>, comparison: &Comparison) -> (Vec<Record>, Vec<Record>) {
    let mut preferred = Vec::new();
    let mut notpreferred = Vec::new();
    let mut incomparable = Vec::new();
    for rec in &records {
        if comparison.is_best_record(rec) {
            preferred.push(rec.clone());
        } else if comparison.is_worst_record(rec) {
            notpreferred.push(rec.clone());
        } else {
            incomparable.push(rec.clone());
        }
    }
    if preferred.is_empty() {
        (records, Vec::new())
    } else {
        preferred.extend(incomparable);
        (preferred, notpreferred)
    }
}

fn build_partitions(records: &[Record], attrs: &[Attribute]) -> HashMap<Record, Vec<Record>> {
    let mut map: HashMap<Record, Vec<Record>> = HashMap::new();
    for rec in records {
        map.entry(rec.project(attrs)).or_default().push(rec.clone());
    }
    map
}

/// Partitions `records` by every attribute not in `comparison`'s
/// indifferent set, then applies [`best_direct`] within each partition.
fn best_partition(attribute_list: &[Attribute], records: Vec<Record>, comparison: &Comparison) -> (Vec<Record>, Vec<Record>) {
    let att_set: Vec<Attribute> = attribute_list.iter().filter(|a| !comparison.indifferent_set().contains(*a)).cloned().collect();
    let partitions = build_partitions(&records, &att_set);
    let mut dominant = Vec::new();
    let mut dominated = Vec::new();
    for group in partitions.into_values() {
        let (pref, notpref) = best_direct(group, comparison);
        dominant.extend(pref);
        dominated.extend(notpref);
    }
    (dominant, dominated)
}

fn get_best_partition(theory: &CpTheory, records: Vec<Record>) -> Vec<Record> {
    let attrs: Vec<Attribute> = records.first().map(|r| r.attributes().cloned().collect()).unwrap_or_default();
    let mut current = records;
    for comparison in theory.comparisons() {
        if current.is_empty() {
            break;
        }
        current = best_partition(&attrs, current, comparison).0;
    }
    current
}

fn get_topk_partition(theory: &CpTheory, records: Vec<Record>, top: usize) -> Vec<Record> {
    let attrs: Vec<Attribute> = records.first().map(|r| r.attributes().cloned().collect()).unwrap_or_default();
    let mut record_list = records;
    let mut topk = Vec::new();
    while topk.len() < top && !record_list.is_empty() {
        let mut dominated_list = Vec::new();
        for comparison in theory.comparisons() {
            let (dominant, notpref) = best_partition(&attrs, record_list, comparison);
            record_list = dominant;
            dominated_list.extend(notpref);
        }
        topk.extend(record_list);
        record_list = dominated_list;
    }
    topk.truncate(top);
    topk
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;
    use crate::formula::Formula;
    use crate::interval::Interval;
    use crate::operator::source::RecordStream;
    use crate::rule::{Condition, CpRule, Preference};
    use crate::theory::Algorithm;
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn rec(v: i64) -> Record {
        let mut r = Record::new();
        r.set(attr("price"), Value::Int(v));
        r
    }

    /// A single rule preferring `price <= 10` over `price >= 11`, all
    /// else being equal (no condition, no indifferent attributes).
    fn cheap_preferred_theory() -> CpTheory {
        let condition = Condition::new(Formula::new());
        let preference = Preference::new(attr("price"), Interval::one_sided("<=", Value::Int(10)), Interval::one_sided(">=", Value::Int(11)), hashbrown::HashSet::new());
        let rule = CpRule::new(condition, preference);
        CpTheory::new(alloc::vec![rule], Algorithm::Partition, false).expect("rule is consistent")
    }

    #[test]
    fn partition_algorithm_keeps_only_cheap_records() {
        let mut source = RecordStream::new(alloc::vec![attr("price")]);
        source.run(0, alloc::vec![rec(5), rec(20)]);
        let mut pref = PreferenceOp::new(source, cheap_preferred_theory(), PreferenceAlgorithm::Partition, -1);
        pref.run(0);
        assert_eq!(pref.get_current_list(), &alloc::vec![rec(5)]);
    }

    #[test]
    fn depth_search_keeps_only_cheap_records() {
        let mut source = RecordStream::new(alloc::vec![attr("price")]);
        source.run(0, alloc::vec![rec(5), rec(20)]);
        let mut pref = PreferenceOp::new(source, cheap_preferred_theory(), PreferenceAlgorithm::DepthSearch, -1);
        pref.run(0);
        assert_eq!(pref.get_current_list(), &alloc::vec![rec(5)]);
    }

    #[test]
    fn zero_topk_emits_nothing() {
        let mut source = RecordStream::new(alloc::vec![attr("price")]);
        source.run(0, alloc::vec![rec(5)]);
        let mut pref = PreferenceOp::new(source, cheap_preferred_theory(), PreferenceAlgorithm::Partition, 0);
        pref.run(0);
        assert!(pref.get_current_list().is_empty());
    }
}
