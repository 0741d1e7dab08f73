//! CONSEQ: splits each input sequence into its maximal runs of
//! consecutive timestamps.
//!
//! Ground truth: `Sequence.get_ctsubsequences` for the run-splitting rule
//! itself; the incremental maintenance algorithm below is this crate's
//! own completion of `operators/sequence.py::ConseqOp.run`, which the
//! original source leaves as `raise NotImplementedError`.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::attribute::Attribute;
use crate::operator::diff::leading_drop_and_tail;
use crate::operator::{Operator, OperatorState, ResultKind, SeqProducer};
use crate::record::Record;
use crate::sequence::{Position, Sequence};

pub struct ConseqOp<Op> {
    operand: Op,
    previous_full: HashMap<Record, Sequence>,
    runs: HashMap<Record, Vec<Sequence>>,
    sequence_list: Vec<Sequence>,
    state: OperatorState,
}

impl<Op: SeqProducer> ConseqOp<Op> {
    #[must_use]
    pub fn new(operand: Op) -> Self {
        Self {
            operand,
            previous_full: HashMap::new(),
            runs: HashMap::new(),
            sequence_list: Vec::new(),
            state: OperatorState::new(),
        }
    }

    fn rebuild_current(&mut self) {
        self.sequence_list = self.runs.values().flatten().cloned().collect();
        let records = self
            .sequence_list
            .iter()
            .flat_map(|seq| (0..seq.len()).filter_map(move |i| seq.position(i).cloned()))
            .collect();
        self.state.set_current(records);
    }

    /// Incremental maintenance: consumes each identifier's front
    /// expiry/back append delta against the previous tick's full
    /// sequence, rather than rescanning every timestamp.
    pub fn run(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        let live = self.operand.get_sequence_list();
        let live_ids: hashbrown::HashSet<Record> = live.iter().map(|s| s.identifier().clone()).collect();
        self.previous_full.retain(|id, _| live_ids.contains(id));
        self.runs.retain(|id, _| live_ids.contains(id));
        for seq in live {
            let id = seq.identifier().clone();
            let (dropped, tail) = leading_drop_and_tail(self.previous_full.get(&id), seq);
            let entry = self.runs.entry(id.clone()).or_default();
            update_runs(entry, dropped, &tail);
            self.previous_full.insert(id, seq.clone());
        }
        self.rebuild_current();
        tracing::debug!(timestamp, runs = self.sequence_list.len(), "CONSEQ tick");
    }

    /// From-scratch fallback: recomputes every identifier's run
    /// decomposition by rescanning timestamps, ignoring cached state.
    pub fn run_naive(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        self.runs.clear();
        self.previous_full.clear();
        for seq in self.operand.get_sequence_list() {
            self.runs.insert(seq.identifier().clone(), seq.ct_subsequences());
            self.previous_full.insert(seq.identifier().clone(), seq.clone());
        }
        self.rebuild_current();
    }
}

/// Drops `dropped` leading positions across the front runs (partial
/// delete on the first surviving one), then appends `tail`, fusing into
/// the last run only when a new position's timestamp continues it.
fn update_runs(runs: &mut Vec<Sequence>, dropped: usize, tail: &[Position]) {
    let mut remaining = dropped;
    while remaining > 0 {
        let Some(first) = runs.first_mut() else { break };
        let run_len = first.len();
        if run_len <= remaining {
            remaining -= run_len;
            runs.remove(0);
        } else {
            first.delete_first(remaining);
            remaining = 0;
        }
    }
    for pos in tail {
        let fuses = runs.last().and_then(Sequence::last_position).is_some_and(|last| pos.timestamp() == last.timestamp() + 1);
        if fuses {
            let last = runs.last_mut().expect("fuses implies a last run exists");
            last.append_position(pos.record().clone(), pos.timestamp(), pos.start(), pos.end());
        } else {
            let identifier = runs.first().map_or_else(Record::new, |r| r.identifier().clone());
            let mut new_run = Sequence::with_identifier(identifier);
            new_run.append_position(pos.record().clone(), pos.timestamp(), pos.start(), pos.end());
            runs.push(new_run);
        }
    }
}

impl<Op: SeqProducer> Operator for ConseqOp<Op> {
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

impl<Op: SeqProducer> SeqProducer for ConseqOp<Op> {
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
        SeqOp::new(source, alloc::vec![attr("id")], 10, 1)
    }

    #[test]
    fn splits_into_two_runs_across_a_timestamp_gap() {
        let mut conseq = ConseqOp::new(make_seq_op());
        for (t, v) in [(0, 1), (1, 2), (3, 3), (4, 4)] {
            conseq.operand.tick(t, alloc::vec![rec(1, v)]);
            conseq.run(t);
        }
        assert_eq!(conseq.get_sequence_list().len(), 2);
        let mut lens: Vec<usize> = conseq.get_sequence_list().iter().map(Sequence::len).collect();
        lens.sort_unstable();
        assert_eq!(lens, alloc::vec![2, 2]);
    }

    #[test]
    fn incremental_matches_naive_after_more_insertions() {
        let mut conseq_inc = ConseqOp::new(make_seq_op());
        for t in 0..6 {
            conseq_inc.operand.tick(t, alloc::vec![rec(1, t)]);
            conseq_inc.run(t);
        }

        let mut seq_op_naive = make_seq_op();
        for t in 0..6 {
            seq_op_naive.tick(t, alloc::vec![rec(1, t)]);
        }
        let mut conseq_naive = ConseqOp::new(seq_op_naive);
        conseq_naive.run_naive(5);

        let mut inc_lens: Vec<usize> = conseq_inc.get_sequence_list().iter().map(Sequence::len).collect();
        let mut naive_lens: Vec<usize> = conseq_naive.get_sequence_list().iter().map(Sequence::len).collect();
        inc_lens.sort_unstable();
        naive_lens.sort_unstable();
        assert_eq!(inc_lens, naive_lens);
    }
}
