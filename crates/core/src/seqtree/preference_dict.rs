//! Per-depth preference theory lookup and the partition hierarchy each
//! [`crate::seqtree::SeqNode`] uses to rank its children.
//!
//! Ground truth: `operators/seqtreehierarchy.py`.

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::comparison::Comparison;
use crate::record::Record;
use crate::sequence::Sequence;
use crate::theory::{Algorithm, CpTheory, TcpTheory};

/// The temporal rules whose conditions hold for a sequence's last position,
/// turned into a present-tense [`CpTheory`] over the records reachable at
/// that tree depth.
///
/// Ground truth: `PreferenceDict`.
#[derive(Clone)]
pub struct PreferenceDict {
    tcp_theory: Rc<TcpTheory>,
    cache: HashMap<Vec<usize>, Rc<CpTheory>>,
}

impl PreferenceDict {
    #[must_use]
    pub fn new(tcp_theory: Rc<TcpTheory>) -> Self {
        Self { tcp_theory, cache: HashMap::new() }
    }

    fn theory_for(&mut self, sequence: Option<&Sequence>) -> Rc<CpTheory> {
        let rule_indices = rules_for_sequence(sequence, &self.tcp_theory);
        if let Some(cached) = self.cache.get(&rule_indices) {
            return Rc::clone(cached);
        }
        let rules: Vec<_> = rule_indices
            .iter()
            .map(|&i| self.tcp_theory.rules()[i].to_cp_rule())
            .collect();
        let theory = Rc::new(
            CpTheory::new(rules, Algorithm::Partition, true).expect("temporal rule subset is consistent by construction"),
        );
        self.cache.insert(rule_indices, Rc::clone(&theory));
        theory
    }

    /// A fresh partition hierarchy scoped to the rules valid for `sequence`.
    pub fn hierarchy(&mut self, sequence: Option<&Sequence>) -> NodeHierarchy {
        NodeHierarchy::new(self.theory_for(sequence))
    }
}

/// `TCPCondition.is_temporal_valid_by_position` checked against every rule,
/// at one past-the-end position appended to `sequence` -- the same trick
/// `get_rules_for_sequence` uses to reuse the past-tense position checks
/// without a present record to test them against yet.
fn rules_for_sequence(sequence: Option<&Sequence>, tcp_theory: &TcpTheory) -> Vec<usize> {
    let mut seq = sequence.map_or_else(Sequence::new, Sequence::copy);
    seq.append_position(Record::new(), 0, 0, 0);
    let probe_pos = seq.len() - 1;
    let mut indices = Vec::new();
    for (i, rule) in tcp_theory.rules().iter().enumerate() {
        if rule.condition().is_temporal_valid_by_position(&seq, probe_pos) {
            indices.push(i);
        }
    }
    indices
}

/// Partition-counter hierarchy scoped to one [`crate::seqtree::SeqNode`]'s
/// children, keyed directly by child [`Record`] rather than an arena id --
/// a node's children dictionary already gives every record a unique slot.
///
/// Ground truth: `PartitionHierarchy` (the `seqtreehierarchy.py` copy, not
/// the stream-level one in `updatedata.py`).
#[derive(Clone)]
pub struct NodeHierarchy {
    theory: Rc<CpTheory>,
    records: HashMap<Record, ()>,
    pref_count: HashMap<(usize, Record), usize>,
    notpref_set: HashMap<(usize, Record), Vec<Record>>,
    dominated_count: HashMap<Record, usize>,
}

fn partition_id(record: &Record, comparison_id: usize, comparison: &Comparison) -> (usize, Record) {
    let mut projected = record.clone();
    for attr in comparison.indifferent_set() {
        projected.remove(attr);
    }
    (comparison_id, projected)
}

impl NodeHierarchy {
    fn new(theory: Rc<CpTheory>) -> Self {
        Self {
            theory,
            records: HashMap::new(),
            pref_count: HashMap::new(),
            notpref_set: HashMap::new(),
            dominated_count: HashMap::new(),
        }
    }

    fn comparisons(&self) -> &[Comparison] {
        self.theory.comparisons()
    }

    /// Inserts `record`, returning whether it arrived already dominated.
    pub fn add(&mut self, record: &Record) -> bool {
        self.records.insert(record.clone(), ());
        for (cid, comp) in self.comparisons().iter().enumerate() {
            let pid = partition_id(record, cid, comp);
            if comp.is_best_record(record) {
                let count = self.pref_count.entry(pid.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    if let Some(others) = self.notpref_set.get(&pid) {
                        for other in others {
                            *self.dominated_count.entry(other.clone()).or_insert(0) += 1;
                        }
                    }
                }
            } else if comp.is_worst_record(record) {
                self.notpref_set.entry(pid.clone()).or_default().push(record.clone());
                if self.pref_count.contains_key(&pid) {
                    *self.dominated_count.entry(record.clone()).or_insert(0) += 1;
                }
            }
        }
        self.dominated_count.contains_key(record)
    }

    pub fn delete(&mut self, record: &Record) {
        self.records.remove(record);
        for (cid, comp) in self.comparisons().iter().enumerate() {
            let pid = partition_id(record, cid, comp);
            if comp.is_best_record(record) {
                if let Some(count) = self.pref_count.get_mut(&pid) {
                    if *count <= 1 {
                        self.pref_count.remove(&pid);
                        if let Some(others) = self.notpref_set.get(&pid) {
                            for other in others.clone() {
                                if let Some(c) = self.dominated_count.get_mut(&other) {
                                    if *c <= 1 {
                                        self.dominated_count.remove(&other);
                                    } else {
                                        *c -= 1;
                                    }
                                }
                            }
                        }
                    } else {
                        *count -= 1;
                    }
                }
            } else if comp.is_worst_record(record) {
                if let Some(set) = self.notpref_set.get_mut(&pid) {
                    if let Some(pos) = set.iter().position(|r| r == record) {
                        set.remove(pos);
                    }
                    if set.is_empty() {
                        self.notpref_set.remove(&pid);
                    }
                }
                self.dominated_count.remove(record);
            }
        }
    }

    #[must_use]
    pub fn best(&self) -> Vec<Record> {
        self.records.keys().filter(|r| !self.dominated_count.contains_key(*r)).cloned().collect()
    }

    #[must_use]
    pub fn dominant_dominated(&self) -> (Vec<Record>, Vec<Record>) {
        let mut dominant = Vec::new();
        let mut dominated = Vec::new();
        for record in self.records.keys() {
            if self.dominated_count.contains_key(record) {
                dominated.push(record.clone());
            } else {
                dominant.push(record.clone());
            }
        }
        (dominant, dominated)
    }
}
