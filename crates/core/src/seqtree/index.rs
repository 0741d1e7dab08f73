//! Tick-driven wrapper around [`SeqTree`]: tracks which live sequence owns
//! which node, so a batch of per-tick mutations (new sequence arrived,
//! existing sequence grew/shrank) turns into the right mix of
//! insert/delete/move calls against the tree.
//!
//! Ground truth: `operators/seqtreeindex.py::SeqIndex`.

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::sequence::Sequence;
use crate::seqtree::node::SeqTree;
use crate::theory::TcpTheory;

pub struct SeqIndex {
    tree: SeqTree,
    /// Caller-assigned sequence id -> (the sequence as last indexed, the
    /// node it was filed under).
    entries: HashMap<u64, (Sequence, usize)>,
}

impl SeqIndex {
    #[must_use]
    pub fn new(tcp_theory: Rc<TcpTheory>, pruning: bool) -> Self {
        Self { tree: SeqTree::new(tcp_theory, pruning), entries: HashMap::new() }
    }

    fn add_sequence(&mut self, seq_id: u64, sequence: Sequence) {
        let node = self.tree.insert(seq_id, sequence.clone());
        self.entries.insert(seq_id, (sequence, node));
    }

    /// Applies one tick's worth of sequence state: `current` holds every
    /// sequence alive this tick (its `inserted`/`deleted` counters already
    /// reflect what changed since the last tick). Sequences not present in
    /// `current` are treated as fully removed.
    pub fn update(&mut self, current: &[(u64, Sequence)]) {
        let mut delete_list = Vec::new();
        let mut insert_list = Vec::new();
        let mut move_list = Vec::new();

        let current_ids: hashbrown::HashSet<u64> = current.iter().map(|(id, _)| *id).collect();
        for (&seq_id, (sequence, node)) in &self.entries {
            if !current_ids.contains(&seq_id) {
                delete_list.push((seq_id, *node));
                continue;
            }
            let deleted = sequence.deleted_count();
            let inserted = sequence.inserted_count();
            if deleted > 0 {
                delete_list.push((seq_id, *node));
            } else if inserted > 0 {
                move_list.push(seq_id);
            }
        }

        for (seq_id, sequence) in current {
            if !self.entries.contains_key(seq_id) {
                insert_list.push((*seq_id, sequence.clone()));
            }
        }

        for (seq_id, node) in delete_list {
            self.tree.delete(node, seq_id);
            self.entries.remove(&seq_id);
            if let Some((_, sequence)) = current.iter().find(|(id, _)| *id == seq_id) {
                if !sequence.is_empty() {
                    insert_list.push((seq_id, sequence.clone()));
                }
            }
        }
        for (seq_id, sequence) in insert_list {
            self.add_sequence(seq_id, sequence);
        }
        for seq_id in move_list {
            let (_, old_node) = self.entries[&seq_id].clone();
            let sequence = current.iter().find(|(id, _)| *id == seq_id).map(|(_, s)| s.clone()).unwrap_or_default();
            let new_node = self.tree.insert(seq_id, sequence.clone());
            self.tree.delete(old_node, seq_id);
            self.entries.insert(seq_id, (sequence, new_node));
        }
        self.tree.clean();
    }

    #[must_use]
    pub fn best_sequences(&self) -> Vec<Sequence> {
        self.tree.best_sequences()
    }

    /// Computed against a clone of the index's tree, leaving live state
    /// (and every sequence's dominance bookkeeping) untouched.
    #[must_use]
    pub fn topk_sequences(&self, k: usize) -> Vec<Sequence> {
        self.tree.clone().topk_sequences(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, DataType};
    use crate::interval::Interval;
    use crate::record::Record;
    use crate::rule::condition::TcpCondition;
    use crate::rule::{Preference, TcpRule};
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn rec(v: i64) -> Record {
        let mut r = Record::new();
        r.set(attr("a"), Value::Int(v));
        r
    }

    fn one_position_sequence(v: i64, ts: i64) -> Sequence {
        let mut seq = Sequence::new();
        seq.append_position(rec(v), ts, ts, ts + 10);
        seq
    }

    fn theory() -> Rc<TcpTheory> {
        let rule = TcpRule::new(
            TcpCondition::new(false, Vec::new()),
            Preference::new(
                attr("a"),
                Interval::one_sided("=", Value::Int(1)),
                Interval::one_sided("=", Value::Int(0)),
                hashbrown::HashSet::new(),
            ),
        );
        Rc::new(TcpTheory::new(alloc::vec![rule]).unwrap())
    }

    #[test]
    fn update_indexes_new_sequences_and_best_reflects_dominance() {
        let mut index = SeqIndex::new(theory(), false);
        index.update(&[(0, one_position_sequence(1, 0)), (1, one_position_sequence(0, 0))]);
        let best = index.best_sequences();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].position(0), Some(&rec(1)));
    }

    #[test]
    fn removing_a_sequence_promotes_the_rest() {
        let mut index = SeqIndex::new(theory(), false);
        index.update(&[(0, one_position_sequence(1, 0)), (1, one_position_sequence(0, 0))]);
        index.update(&[(1, one_position_sequence(0, 0))]);
        let best = index.best_sequences();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].position(0), Some(&rec(0)));
    }
}
