//! `TemporalPreferenceOp`: drives sequence-level best/top-k, either by
//! pairwise dominance search or via a [`SeqIndex`].
//!
//! Ground truth: `operators/temporalpreference.py::TemporalPreferenceOp`.

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::attribute::Attribute;
use crate::operator::{Operator, OperatorState, ResultKind, SeqProducer};
use crate::record::Record;
use crate::seqtree::SeqIndex;
use crate::sequence::Sequence;
use crate::theory::TcpTheory;

/// Which sequence-dominance strategy `TemporalPreferenceOp` drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePreferenceAlgorithm {
    /// Pairwise dominance search, recomputed from scratch every tick.
    DepthSearch,
    /// [`SeqIndex`] without pruning.
    SeqTree,
    /// [`SeqIndex`] with pruning.
    SeqTreePruning,
}

pub struct TemporalPreferenceOp<Op> {
    operand: Op,
    tcptheory: Rc<TcpTheory>,
    algorithm: SequencePreferenceAlgorithm,
    top: i64,
    seqindex: Option<SeqIndex>,
    ids: HashMap<Record, u64>,
    next_id: u64,
    sequence_list: Vec<Sequence>,
    state: OperatorState,
}

impl<Op: SeqProducer> TemporalPreferenceOp<Op> {
    /// `top == 0` emits nothing every tick; `top > 0` requests a top-k
    /// list of sequences; any other negative value requests the
    /// dominant (best) set.
    #[must_use]
    pub fn new(operand: Op, tcptheory: Rc<TcpTheory>, algorithm: SequencePreferenceAlgorithm, top: i64) -> Self {
        let seqindex = match algorithm {
            SequencePreferenceAlgorithm::SeqTree => Some(SeqIndex::new(Rc::clone(&tcptheory), false)),
            SequencePreferenceAlgorithm::SeqTreePruning => Some(SeqIndex::new(Rc::clone(&tcptheory), true)),
            SequencePreferenceAlgorithm::DepthSearch => None,
        };
        Self {
            operand,
            tcptheory,
            algorithm,
            top,
            seqindex,
            ids: HashMap::new(),
            next_id: 0,
            sequence_list: Vec::new(),
            state: OperatorState::new(),
        }
    }

    /// Stable per-identifier id, assigned on first sight and reused for
    /// the identifier's lifetime -- `SeqIndex` keys its tree entries by
    /// this id rather than by sequence content.
    fn id_for(&mut self, identifier: &Record) -> u64 {
        if let Some(&id) = self.ids.get(identifier) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(identifier.clone(), id);
        id
    }

    fn tagged_sequences(&mut self) -> Vec<(u64, Sequence)> {
        let live: Vec<Sequence> = self.operand.get_sequence_list().to_vec();
        live.into_iter().map(|seq| (self.id_for(seq.identifier()), seq)).collect()
    }

    pub fn run(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        self.sequence_list = if self.top == 0 {
            Vec::new()
        } else if self.top > 0 {
            let k = self.top as usize;
            match self.algorithm {
                SequencePreferenceAlgorithm::DepthSearch => get_topk_search(&self.tcptheory, self.operand.get_sequence_list().to_vec(), k),
                SequencePreferenceAlgorithm::SeqTree | SequencePreferenceAlgorithm::SeqTreePruning => {
                    let tagged = self.tagged_sequences();
                    let index = self.seqindex.as_mut().expect("seqindex built for this algorithm");
                    index.update(&tagged);
                    index.topk_sequences(k)
                }
            }
        } else {
            match self.algorithm {
                SequencePreferenceAlgorithm::DepthSearch => get_best_search(&self.tcptheory, self.operand.get_sequence_list().to_vec()),
                SequencePreferenceAlgorithm::SeqTree | SequencePreferenceAlgorithm::SeqTreePruning => {
                    let tagged = self.tagged_sequences();
                    let index = self.seqindex.as_mut().expect("seqindex built for this algorithm");
                    index.update(&tagged);
                    index.best_sequences()
                }
            }
        };
        let records = self
            .sequence_list
            .iter()
            .flat_map(|seq| (0..seq.len()).filter_map(move |i| seq.position(i).cloned()))
            .collect();
        tracing::debug!(timestamp, top = self.top, kept = self.sequence_list.len(), "TemporalPreferenceOp tick");
        self.state.set_current(records);
    }
}

impl<Op: SeqProducer> Operator for TemporalPreferenceOp<Op> {
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

impl<Op: SeqProducer> SeqProducer for TemporalPreferenceOp<Op> {
    fn get_sequence_list(&self) -> &[Sequence] {
        &self.sequence_list
    }
}

/// Pairwise dominance partition of a sequence list, mirroring the
/// front-pop loop in `_get_dominant_dominated`.
fn dominant_and_dominated(theory: &TcpTheory, mut sequence_list: Vec<Sequence>) -> (Vec<Sequence>, Vec<Sequence>) {
    let mut dominant_list = Vec::new();
    let mut dominated_list = Vec::new();
    while !sequence_list.is_empty() {
        let seq = sequence_list.remove(0);
        let mut not_dominated = Vec::new();
        let mut dominated = false;
        while !sequence_list.is_empty() && !dominated {
            let other = sequence_list.remove(0);
            if theory.dominates_by_search(&seq, &other) {
                dominated_list.push(other);
            } else if theory.dominates_by_search(&other, &seq) {
                dominated_list.push(seq.clone());
                not_dominated.push(other);
                dominated = true;
            } else {
                not_dominated.push(other);
            }
        }
        sequence_list.extend(not_dominated);
        if !dominated {
            dominant_list.push(seq);
        }
    }
    (dominant_list, dominated_list)
}

fn get_best_search(theory: &TcpTheory, sequences: Vec<Sequence>) -> Vec<Sequence> {
    dominant_and_dominated(theory, sequences).0
}

fn get_topk_search(theory: &TcpTheory, sequences: Vec<Sequence>, top: usize) -> Vec<Sequence> {
    let mut dominated_list = sequences;
    let mut topk = Vec::new();
    while topk.len() < top && !dominated_list.is_empty() {
        let (dominant, rest) = dominant_and_dominated(theory, dominated_list);
        dominated_list = rest;
        topk.extend(dominant);
    }
    topk.truncate(top);
    topk
}
