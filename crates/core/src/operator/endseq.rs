//! ENDSEQ: maintains every suffix of each input sequence, from longest to
//! shortest, dropping suffixes once they exceed the live sequence's
//! length.
//!
//! Ground truth: `Sequence.get_ep_subsequences` for the suffix rule
//! itself; the incremental maintenance algorithm below is this crate's
//! own completion of `operators/sequence.py::EndseqOp.run`, which the
//! original source leaves as `raise NotImplementedError`.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::attribute::Attribute;
use crate::operator::diff::leading_drop_and_tail;
use crate::operator::{Operator, OperatorState, ResultKind, SeqProducer};
use crate::record::Record;
use crate::sequence::Sequence;

pub struct EndseqOp<Op> {
    operand: Op,
    previous_full: HashMap<Record, Sequence>,
    suffixes: HashMap<Record, Vec<Sequence>>,
    sequence_list: Vec<Sequence>,
    state: OperatorState,
}

impl<Op: SeqProducer> EndseqOp<Op> {
    #[must_use]
    pub fn new(operand: Op) -> Self {
        Self {
            operand,
            previous_full: HashMap::new(),
            suffixes: HashMap::new(),
            sequence_list: Vec::new(),
            state: OperatorState::new(),
        }
    }

    fn rebuild_current(&mut self) {
        self.sequence_list = self.suffixes.values().flatten().cloned().collect();
        let records = self
            .sequence_list
            .iter()
            .flat_map(|seq| (0..seq.len()).filter_map(move |i| seq.position(i).cloned()))
            .collect();
        self.state.set_current(records);
    }

    /// Extends every live suffix with the newly-arrived tail, appends a
    /// fresh suffix per new position, then drops suffixes from the front
    /// whose length now exceeds the sequence's new total length.
    pub fn run(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        let live = self.operand.get_sequence_list();
        let live_ids: hashbrown::HashSet<Record> = live.iter().map(|s| s.identifier().clone()).collect();
        self.previous_full.retain(|id, _| live_ids.contains(id));
        self.suffixes.retain(|id, _| live_ids.contains(id));
        for seq in live {
            let id = seq.identifier().clone();
            let (_, tail) = leading_drop_and_tail(self.previous_full.get(&id), seq);
            let entry = self.suffixes.entry(id.clone()).or_default();
            if !tail.is_empty() {
                let mut tail_seq = Sequence::with_identifier(id.clone());
                for pos in &tail {
                    tail_seq.append_position(pos.record().clone(), pos.timestamp(), pos.start(), pos.end());
                }
                for suffix in entry.iter_mut() {
                    suffix.append_sequence(&tail_seq);
                }
                for new_suffix in tail_seq.ep_subsequences() {
                    entry.push(new_suffix);
                }
            }
            while entry.first().is_some_and(|s| s.len() > seq.len()) {
                entry.remove(0);
            }
            self.previous_full.insert(id, seq.clone());
        }
        self.rebuild_current();
        tracing::debug!(timestamp, suffixes = self.sequence_list.len(), "ENDSEQ tick");
    }

    /// From-scratch fallback: recomputes every identifier's suffix list
    /// directly from its live sequence.
    pub fn run_naive(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        self.suffixes.clear();
        self.previous_full.clear();
        for seq in self.operand.get_sequence_list() {
            self.suffixes.insert(seq.identifier().clone(), seq.ep_subsequences());
            self.previous_full.insert(seq.identifier().clone(), seq.clone());
        }
        self.rebuild_current();
    }
}

impl<Op: SeqProducer> Operator for EndseqOp<Op> {
    fn state(&self) -> &OperatorState {
        &self.state
    }

    fn get_attribute_list(&self) -> &[Attribute] {
        self.operand.get_attribute_list()
    }

    fn get_result_type(&self) -> ResultKind {
        ResultKind::Table
    }

    fn is_consistent(&self) -> bool {
        self.operand.is_consistent()
    }
}

impl<Op: SeqProducer> SeqProducer for EndseqOp<Op> {
    fn get_sequence_list(&self) -> &[Sequence] {
        &self.sequence_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;
    use crate::operator::source::RecordStream;
    use crate::operator::SeqOp;
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn rec(id: i64, v: i64) -> Record {
        let mut r = Record::new();
        r.set(attr("id"), Value::Int(id));
        r.set(attr("v"), Value::Int(v));
        r
    }

    fn make_seq_op() -> SeqOp<RecordStream> {
        let source = RecordStream::new(alloc::vec![attr("id"), attr("v")]);
        SeqOp::new(source, alloc::vec![attr("id")], -1, -1)
    }

    #[test]
    fn three_positions_produce_three_decreasing_suffixes() {
        let mut endseq = EndseqOp::new(make_seq_op());
        for (t, v) in [(0, 1), (1, 2), (2, 3)] {
            endseq.operand.tick(t, alloc::vec![rec(1, v)]);
            endseq.run(t);
        }
        assert_eq!(endseq.get_sequence_list().len(), 3);
        let mut lens: Vec<usize> = endseq.get_sequence_list().iter().map(Sequence::len).collect();
        lens.sort_unstable();
        assert_eq!(lens, alloc::vec![1, 2, 3]);
    }

    #[test]
    fn incremental_matches_naive_after_more_insertions() {
        let mut endseq_inc = EndseqOp::new(make_seq_op());
        for t in 0..5 {
            endseq_inc.operand.tick(t, alloc::vec![rec(1, t)]);
            endseq_inc.run(t);
        }

        let mut seq_op_naive = make_seq_op();
        for t in 0..5 {
            seq_op_naive.tick(t, alloc::vec![rec(1, t)]);
        }
        let mut endseq_naive = EndseqOp::new(seq_op_naive);
        endseq_naive.run_naive(4);

        let mut inc_lens: Vec<usize> = endseq_inc.get_sequence_list().iter().map(Sequence::len).collect();
        let mut naive_lens: Vec<usize> = endseq_naive.get_sequence_list().iter().map(Sequence::len).collect();
        inc_lens.sort_unstable();
        naive_lens.sort_unstable();
        assert_eq!(inc_lens, naive_lens);
    }
}
