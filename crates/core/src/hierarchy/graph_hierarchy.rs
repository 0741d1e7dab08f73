//! Dominance-graph incremental hierarchy: an explicit edge `from -> to`
//! whenever `from` dominates `to`; top-k peels the graph breadth-first
//! from its current root set.
//!
//! Ground truth: `operators/updatedata.py::HierarchyGraph`.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::hierarchy::arena::RecordArena;
use crate::hierarchy::Hierarchy;
use crate::record::Record;
use crate::theory::CpTheory;

pub struct HierarchyGraph {
    arena: RecordArena,
    theory: CpTheory,
    successors: HashMap<u64, Vec<u64>>,
    ancestors: HashMap<u64, Vec<u64>>,
    best_set: HashSet<u64>,
}

impl HierarchyGraph {
    #[must_use]
    pub fn new(theory: CpTheory, initial: &[Record]) -> Self {
        let mut h = Self {
            arena: RecordArena::new(),
            theory,
            successors: HashMap::new(),
            ancestors: HashMap::new(),
            best_set: HashSet::new(),
        };
        for record in initial {
            h.add(record);
        }
        h
    }

    fn add_edge(&mut self, from_id: u64, to_id: u64) {
        self.ancestors.entry(to_id).or_default().push(from_id);
        self.successors.entry(from_id).or_default().push(to_id);
    }

    fn add(&mut self, record: &Record) {
        let (new_id, first) = self.arena.add(record);
        if !first {
            return;
        }
        let mut dominated = false;
        let other_ids: Vec<u64> = self.arena.ids().filter(|&id| id != new_id).collect();
        for other_id in other_ids {
            let other_rec = self.arena.record(other_id).expect("id from arena is present").clone();
            if self.theory.dominates(record, &other_rec) {
                self.add_edge(new_id, other_id);
                self.best_set.remove(&other_id);
            } else if self.theory.dominates(&other_rec, record) {
                dominated = true;
                self.add_edge(other_id, new_id);
            }
        }
        if !dominated {
            self.best_set.insert(new_id);
        }
    }

    fn delete(&mut self, record: &Record) {
        let (del_id, removed) = self.arena.delete(record);
        if !removed {
            return;
        }
        self.best_set.remove(&del_id);
        if let Some(anc_list) = self.ancestors.remove(&del_id) {
            for other_id in anc_list {
                if let Some(suc) = self.successors.get_mut(&other_id) {
                    if let Some(pos) = suc.iter().position(|&x| x == del_id) {
                        suc.remove(pos);
                    }
                }
            }
        }
        if let Some(suc_list) = self.successors.remove(&del_id) {
            for other_id in suc_list {
                if let Some(anc) = self.ancestors.get_mut(&other_id) {
                    if let Some(pos) = anc.iter().position(|&x| x == del_id) {
                        anc.remove(pos);
                    }
                    if anc.is_empty() {
                        self.best_set.insert(other_id);
                    }
                }
            }
        }
    }
}

impl Hierarchy for HierarchyGraph {
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
            let record = self.arena.record(id).expect("best id is live");
            out.extend(core::iter::repeat(record.clone()).take(self.arena.count(id)));
        }
        out
    }

    fn topk(&self, k: usize) -> Vec<Record> {
        let mut anc_dict: HashMap<u64, Vec<u64>> = self.ancestors.clone();
        let mut current: Vec<u64> = self.best_set.iter().copied().collect();
        let mut result = Vec::new();
        let total_ids = self.arena.ids().count();
        let mut seen = 0usize;
        while result.len() < k && seen < total_ids && !current.is_empty() {
            let mut next = Vec::new();
            for rec_id in current {
                seen += 1;
                let record = self.arena.record(rec_id).expect("queued id is live");
                result.extend(core::iter::repeat(record.clone()).take(self.arena.count(rec_id)));
                if let Some(successors) = self.successors.get(&rec_id) {
                    for &next_id in successors {
                        if let Some(anc) = anc_dict.get_mut(&next_id) {
                            if let Some(pos) = anc.iter().position(|&x| x == rec_id) {
                                anc.remove(pos);
                            }
                            if anc.is_empty() {
                                next.push(next_id);
                            }
                        }
                    }
                }
            }
            current = next;
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
    use crate::rule::{Condition, CpRule, Preference};
    use crate::theory::Algorithm;
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn rec(v: i64) -> Record {
        let mut r = Record::new();
        r.set(attr("a"), Value::Int(v));
        r
    }

    fn theory() -> CpTheory {
        let rule = CpRule::new(
            Condition::new(Formula::new()),
            Preference::new(
                attr("a"),
                Interval::one_sided("=", Value::Int(1)),
                Interval::one_sided("=", Value::Int(0)),
                HashSet::new(),
            ),
        );
        CpTheory::new(alloc::vec![rule], Algorithm::DepthSearch, false).unwrap()
    }

    #[test]
    fn best_set_excludes_dominated_record() {
        let h = HierarchyGraph::new(theory(), &[rec(1), rec(0)]);
        assert_eq!(h.best_records(), alloc::vec![rec(1)]);
    }

    #[test]
    fn topk_peels_by_successor_edges() {
        let h = HierarchyGraph::new(theory(), &[rec(1), rec(0)]);
        assert_eq!(h.topk(2), alloc::vec![rec(1), rec(0)]);
    }

    #[test]
    fn deleting_dominant_promotes_the_rest() {
        let mut h = HierarchyGraph::new(theory(), &[rec(1), rec(0)]);
        h.update(&[rec(1)], &[]);
        assert_eq!(h.best_records(), alloc::vec![rec(0)]);
    }
}
