//! Sequence-trie index: one node per distinct position prefix, each
//! holding a [`NodeHierarchy`] over its children so the best/top-k
//! sequences can be read off without re-evaluating dominance from scratch.
//!
//! Ground truth: `operators/seqtree.py` (`SeqNode`, `SeqNodePruning`).

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::record::Record;
use crate::sequence::Sequence;
use crate::seqtree::preference_dict::{NodeHierarchy, PreferenceDict};
use crate::theory::TcpTheory;

#[derive(Clone)]
struct SeqNode {
    depth: usize,
    /// The prefix of positions leading here; `None` only for the root.
    sequence: Option<Sequence>,
    /// Position record at this node's depth -> child node index.
    children: HashMap<Record, usize>,
    /// Sequences that end exactly at this node, keyed by caller id.
    sequences: HashMap<u64, Sequence>,
    hierarchy: Option<NodeHierarchy>,
    /// Only meaningful in pruning mode: true once some ancestor (or this
    /// node itself) has been found dominated, at which point its own
    /// hierarchy is torn down.
    dominated: bool,
}

impl SeqNode {
    fn is_empty(&self) -> bool {
        self.sequences.is_empty() && self.children.is_empty()
    }

    fn record(&self) -> Option<Record> {
        self.sequence.as_ref().and_then(Sequence::last_position).map(|p| p.record().clone())
    }
}

/// A trie of [`Sequence`] prefixes with a per-branch-point dominance
/// hierarchy, supporting incremental insert/delete and both a read-only
/// best-sequences walk and a destructive top-k peel.
///
/// `pruning` selects between the two ground-truth node behaviors: plain
/// (`SeqNode`, every node always keeps a live hierarchy) or pruned
/// (`SeqNodePruning`, a node's hierarchy exists only while it has two or
/// more non-dominated children).
#[derive(Clone)]
pub struct SeqTree {
    nodes: Vec<SeqNode>,
    pref_dict: PreferenceDict,
    pruning: bool,
}

impl SeqTree {
    #[must_use]
    pub fn new(tcp_theory: Rc<TcpTheory>, pruning: bool) -> Self {
        let mut pref_dict = PreferenceDict::new(tcp_theory);
        let hierarchy = if pruning { None } else { Some(pref_dict.hierarchy(None)) };
        let root = SeqNode {
            depth: 0,
            sequence: None,
            children: HashMap::new(),
            sequences: HashMap::new(),
            hierarchy,
            dominated: false,
        };
        Self { nodes: alloc::vec![root], pref_dict, pruning }
    }

    /// Inserts `sequence` under `seq_id`, returning the index of the node
    /// it now lives in (pass this to [`Self::delete`] later).
    ///
    /// Ground truth: `SeqNode.add_sequence_recursive` /
    /// `SeqNodePruning.add_sequence_pruning`.
    pub fn insert(&mut self, seq_id: u64, sequence: Sequence) -> usize {
        let total = sequence.len();
        let mut current = 0usize;
        let mut ancestor_dominated = self.nodes[0].dominated;
        loop {
            let depth = self.nodes[current].depth;
            if depth == total {
                self.nodes[current].sequences.insert(seq_id, sequence);
                return current;
            }
            let key = sequence.position(depth).expect("depth < len checked above").clone();
            let child_idx = match self.nodes[current].children.get(&key) {
                Some(&idx) => idx,
                None => self.new_child(current, &sequence, depth, ancestor_dominated),
            };
            ancestor_dominated = ancestor_dominated && self.nodes[child_idx].dominated;
            current = child_idx;
        }
    }

    /// Removes `seq_id` from the node it was inserted into. Leaves empty
    /// branches in place; call [`Self::clean`] to collapse them.
    pub fn delete(&mut self, node_idx: usize, seq_id: u64) {
        self.nodes[node_idx].sequences.remove(&seq_id);
    }

    fn new_child(&mut self, parent_idx: usize, sequence: &Sequence, parent_depth: usize, ancestor_dominated: bool) -> usize {
        let child_depth = parent_depth + 1;
        let prefix = sequence.subsequence(0, child_depth);
        let key = prefix.last_position().expect("non-empty prefix").record().clone();
        let hierarchy = if self.pruning { None } else { Some(self.pref_dict.hierarchy(Some(&prefix))) };
        let node = SeqNode {
            depth: child_depth,
            sequence: Some(prefix),
            children: HashMap::new(),
            sequences: HashMap::new(),
            hierarchy,
            dominated: false,
        };
        let child_idx = self.nodes.len();
        self.nodes.push(node);

        if self.pruning {
            if ancestor_dominated {
                self.nodes[child_idx].dominated = true;
                self.nodes[parent_idx].children.insert(key, child_idx);
            } else {
                if self.nodes[parent_idx].children.len() == 1 {
                    self.restart_hierarchy(parent_idx);
                }
                self.nodes[parent_idx].children.insert(key, child_idx);
                self.add_child_to_hierarchy(parent_idx, child_idx);
            }
        } else {
            self.nodes[parent_idx].children.insert(key, child_idx);
            if let Some(record) = self.nodes[child_idx].record() {
                if let Some(h) = self.nodes[parent_idx].hierarchy.as_mut() {
                    h.add(&record);
                }
            }
        }
        child_idx
    }

    fn add_child_to_hierarchy(&mut self, parent_idx: usize, child_idx: usize) {
        let Some(record) = self.nodes[child_idx].record() else { return };
        let outcome = self.nodes[parent_idx].hierarchy.as_mut().map(|h| h.add(&record));
        match outcome {
            Some(true) => self.set_dominated(child_idx),
            Some(false) => self.update_all_children(parent_idx),
            None => {}
        }
    }

    fn restart_hierarchy(&mut self, node_idx: usize) {
        let prefix = self.nodes[node_idx].sequence.clone();
        let mut hierarchy = self.pref_dict.hierarchy(prefix.as_ref());
        let child_records: Vec<Record> =
            self.nodes[node_idx].children.values().filter_map(|&idx| self.nodes[idx].record()).collect();
        for record in &child_records {
            hierarchy.add(record);
        }
        self.nodes[node_idx].hierarchy = Some(hierarchy);
    }

    fn update_all_children(&mut self, parent_idx: usize) {
        let (dominant, dominated) = match &self.nodes[parent_idx].hierarchy {
            Some(h) => h.dominant_dominated(),
            None => (self.nodes[parent_idx].children.keys().cloned().collect(), Vec::new()),
        };
        for record in &dominated {
            if let Some(&idx) = self.nodes[parent_idx].children.get(record) {
                self.set_dominated(idx);
            }
        }
        for record in &dominant {
            if let Some(&idx) = self.nodes[parent_idx].children.get(record) {
                self.set_dominant(idx);
            }
        }
    }

    fn set_dominated(&mut self, idx: usize) {
        self.nodes[idx].dominated = true;
        self.nodes[idx].hierarchy = None;
    }

    fn set_dominant(&mut self, idx: usize) {
        if self.nodes[idx].dominated {
            if self.nodes[idx].children.len() >= 2 {
                self.restart_hierarchy(idx);
            }
            self.update_all_children(idx);
        }
        self.nodes[idx].dominated = false;
    }

    fn del_child(&mut self, parent_idx: usize, child_idx: usize) {
        let Some(record) = self.nodes[child_idx].record() else { return };
        self.nodes[parent_idx].children.remove(&record);
        if self.pruning {
            if self.nodes[parent_idx].children.len() <= 1 {
                self.nodes[parent_idx].hierarchy = None;
            }
            if let Some(h) = self.nodes[parent_idx].hierarchy.as_mut() {
                h.delete(&record);
            }
        } else if let Some(h) = self.nodes[parent_idx].hierarchy.as_mut() {
            h.delete(&record);
        }
    }

    /// Removes empty branches bottom-up, re-deriving dominance for
    /// surviving siblings wherever a non-dominated (pruning mode) or any
    /// (plain mode) child disappears.
    ///
    /// Ground truth: `SeqNode.clean_recursive` / `SeqNodePruning.clean_recursive`.
    pub fn clean(&mut self) {
        self.clean_recursive(0);
    }

    fn clean_recursive(&mut self, idx: usize) {
        let children: Vec<usize> = self.nodes[idx].children.values().copied().collect();
        for &child_idx in &children {
            self.clean_recursive(child_idx);
        }
        let mut dominant_removed = false;
        let mut to_remove = Vec::new();
        for &child_idx in &children {
            if self.nodes[child_idx].is_empty() {
                to_remove.push(child_idx);
                if self.pruning && !self.nodes[child_idx].dominated {
                    dominant_removed = true;
                }
            }
        }
        for child_idx in to_remove {
            self.del_child(idx, child_idx);
        }
        if self.pruning && !self.nodes[idx].dominated && dominant_removed {
            self.update_all_children(idx);
        }
    }

    fn dominant_children(&self, idx: usize) -> Vec<usize> {
        if self.pruning {
            self.nodes[idx].children.values().copied().filter(|&c| !self.nodes[c].dominated).collect()
        } else {
            match &self.nodes[idx].hierarchy {
                Some(h) => h.best().iter().filter_map(|r| self.nodes[idx].children.get(r).copied()).collect(),
                None => Vec::new(),
            }
        }
    }

    /// The currently dominant sequences, left in place.
    ///
    /// Ground truth: `SeqNode.get_best_sequences_recursive`.
    #[must_use]
    pub fn best_sequences(&self) -> Vec<Sequence> {
        self.best_sequences_recursive(0)
    }

    fn best_sequences_recursive(&self, idx: usize) -> Vec<Sequence> {
        let mut out: Vec<Sequence> = self.nodes[idx].sequences.values().cloned().collect();
        for child_idx in self.dominant_children(idx) {
            out.extend(self.best_sequences_recursive(child_idx));
        }
        out
    }

    fn remove_dominant_sequences(&mut self, idx: usize) -> Vec<Sequence> {
        let mut out: Vec<Sequence> = self.nodes[idx].sequences.drain().map(|(_, s)| s).collect();
        let children = self.dominant_children(idx);
        for child_idx in children {
            out.extend(self.remove_dominant_sequences(child_idx));
            if self.nodes[child_idx].is_empty() {
                self.del_child(idx, child_idx);
            }
        }
        out
    }

    /// Destructively peels the `k` best sequences layer by layer. Callers
    /// that need to keep the live index intact should call this on a
    /// [`Clone`] of the tree (`SeqIndex::topk_sequences` does exactly
    /// that).
    ///
    /// Ground truth: `SeqNode.topk_sequences`.
    pub fn topk_sequences(&mut self, k: usize) -> Vec<Sequence> {
        let mut out = Vec::new();
        while out.len() < k && !self.nodes[0].children.is_empty() {
            out.extend(self.remove_dominant_sequences(0));
        }
        out.truncate(k);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, DataType};
    use crate::interval::Interval;
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

    fn one_position_sequence(v: i64, timestamp: i64) -> Sequence {
        let mut seq = Sequence::new();
        seq.append_position(rec(v), timestamp, timestamp, timestamp + 10);
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
    fn best_sequences_excludes_dominated_single_position_run() {
        let mut tree = SeqTree::new(theory(), false);
        let n0 = tree.insert(0, one_position_sequence(1, 0));
        let n1 = tree.insert(1, one_position_sequence(0, 0));
        let _ = (n0, n1);
        let best = tree.best_sequences();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].position(0), Some(&rec(1)));
    }

    #[test]
    fn pruning_mode_marks_dominated_child() {
        let mut tree = SeqTree::new(theory(), true);
        tree.insert(0, one_position_sequence(1, 0));
        tree.insert(1, one_position_sequence(0, 0));
        let best = tree.best_sequences();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].position(0), Some(&rec(1)));
    }

    #[test]
    fn topk_on_a_clone_leaves_the_live_tree_untouched() {
        let mut tree = SeqTree::new(theory(), false);
        tree.insert(0, one_position_sequence(1, 0));
        tree.insert(1, one_position_sequence(0, 0));
        let mut clone = tree.clone();
        let topk = clone.topk_sequences(2);
        assert_eq!(topk.len(), 2);
        assert_eq!(tree.best_sequences().len(), 1);
    }
}
