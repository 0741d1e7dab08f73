//! Level-based incremental hierarchy: every record's level is one more
//! than the maximum level among its dominating ancestors, zero if it has
//! none.
//!
//! Ground truth: `operators/updatedata.py::HierarchyAncestors`.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::hierarchy::arena::RecordArena;
use crate::hierarchy::Hierarchy;
use crate::record::Record;
use crate::theory::CpTheory;

/// Sentinel level meaning "not yet computed".
const PENDING: i64 = -1;

pub struct HierarchyAncestors {
    arena: RecordArena,
    theory: CpTheory,
    ancestors: HashMap<u64, Vec<u64>>,
    levels: HashMap<u64, i64>,
    pending: VecDeque<u64>,
    best_set: HashSet<u64>,
}

impl HierarchyAncestors {
    #[must_use]
    pub fn new(theory: CpTheory, initial: &[Record]) -> Self {
        let mut h = Self {
            arena: RecordArena::new(),
            theory,
            ancestors: HashMap::new(),
            levels: HashMap::new(),
            pending: VecDeque::new(),
            best_set: HashSet::new(),
        };
        for record in initial {
            h.add(record);
        }
        h.update_level();
        h
    }

    fn add(&mut self, record: &Record) {
        let (id, first) = self.arena.add(record);
        if first {
            self.pending.push_back(id);
            self.levels.insert(id, PENDING);
            self.ancestors.insert(id, Vec::new());
            self.update_ancestors(id, record);
        }
    }

    fn update_ancestors(&mut self, new_id: u64, record: &Record) {
        let other_ids: Vec<u64> = self.arena.ids().filter(|&id| id != new_id).collect();
        for other_id in other_ids {
            let other_rec = self.arena.record(other_id).expect("id from arena is present").clone();
            if self.theory.dominates(&other_rec, record) {
                self.ancestors.get_mut(&new_id).expect("just inserted").push(other_id);
            } else if self.theory.dominates(record, &other_rec) {
                self.ancestors.get_mut(&other_id).expect("existing id has an entry").push(new_id);
                self.pending.push_back(other_id);
                if self.levels.get(&other_id) == Some(&0) {
                    self.best_set.remove(&other_id);
                }
                self.levels.insert(other_id, PENDING);
            }
        }
    }

    fn delete(&mut self, record: &Record) {
        let (del_id, removed) = self.arena.delete(record);
        if removed {
            self.clean(del_id);
        }
    }

    fn clean(&mut self, del_id: u64) {
        let del_level = self.levels[&del_id];
        let other_ids: Vec<u64> = self.ancestors.keys().copied().collect();
        for rec_id in other_ids {
            if rec_id == del_id {
                continue;
            }
            if self.levels[&rec_id] <= del_level {
                continue;
            }
            let had = self
                .ancestors
                .get_mut(&rec_id)
                .is_some_and(|set| set.iter().position(|&x| x == del_id).map(|pos| set.remove(pos)).is_some());
            if had {
                self.pending.push_back(rec_id);
            }
        }
        self.best_set.remove(&del_id);
        self.levels.remove(&del_id);
        self.ancestors.remove(&del_id);
    }

    fn update_level(&mut self) {
        while let Some(rec_id) = self.pending.pop_front() {
            let Some(anc_list) = self.ancestors.get(&rec_id).cloned() else {
                continue;
            };
            if anc_list.is_empty() {
                self.levels.insert(rec_id, 0);
                self.best_set.insert(rec_id);
                continue;
            }
            let mut anc_level = PENDING;
            let mut blocked = false;
            for anc_id in &anc_list {
                let lvl = self.levels[anc_id];
                if lvl == PENDING {
                    blocked = true;
                    break;
                }
                anc_level = anc_level.max(lvl);
            }
            if blocked {
                self.pending.push_back(rec_id);
            } else {
                self.levels.insert(rec_id, anc_level + 1);
            }
        }
    }
}

impl Hierarchy for HierarchyAncestors {
    fn update(&mut self, deleted: &[Record], inserted: &[Record]) {
        for record in deleted {
            self.delete(record);
        }
        for record in inserted {
            self.add(record);
        }
        self.update_level();
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
        let mut entries: Vec<(i64, u64)> = self.levels.iter().map(|(&id, &level)| (level, id)).collect();
        entries.sort_unstable();
        let mut out = Vec::new();
        for (_, id) in entries {
            let record = self.arena.record(id).expect("leveled id is live");
            out.extend(core::iter::repeat(record.clone()).take(self.arena.count(id)));
            if out.len() >= k {
                break;
            }
        }
        out.truncate(k);
        out
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
                hashbrown::HashSet::new(),
            ),
        );
        CpTheory::new(alloc::vec![rule], Algorithm::DepthSearch, false).unwrap()
    }

    #[test]
    fn best_set_excludes_dominated_record() {
        let mut h = HierarchyAncestors::new(theory(), &[rec(1), rec(0)]);
        let best = h.best_records();
        assert_eq!(best, alloc::vec![rec(1)]);
        let topk = h.topk(2);
        assert_eq!(topk, alloc::vec![rec(1), rec(0)]);
    }

    #[test]
    fn deleting_dominant_promotes_the_rest() {
        let mut h = HierarchyAncestors::new(theory(), &[rec(1), rec(0)]);
        h.update(&[rec(1)], &[]);
        assert_eq!(h.best_records(), alloc::vec![rec(0)]);
    }
}
