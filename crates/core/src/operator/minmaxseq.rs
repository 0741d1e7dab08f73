//! MINSEQ[n] / MAXSEQ[n]: filter an operand's live sequences by length,
//! keeping `len >= n` / `len <= n` respectively. Stateless beyond the
//! shared tick bookkeeping -- every tick just re-filters the operand's
//! current sequence list.
//!
//! Ground truth: `spec.md` §4.6.

use alloc::vec::Vec;

use crate::attribute::Attribute;
use crate::operator::{Operator, OperatorState, ResultKind, SeqProducer};
use crate::sequence::Sequence;

pub struct MinseqOp<Op> {
    operand: Op,
    min_len: usize,
    sequence_list: Vec<Sequence>,
    state: OperatorState,
}

impl<Op: SeqProducer> MinseqOp<Op> {
    #[must_use]
    pub const fn new(operand: Op, min_len: usize) -> Self {
        Self { operand, min_len, sequence_list: Vec::new(), state: OperatorState::new() }
    }

    pub fn run(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        self.sequence_list = self.operand.get_sequence_list().iter().filter(|s| s.len() >= self.min_len).cloned().collect();
        let records = self
            .sequence_list
            .iter()
            .flat_map(|seq| (0..seq.len()).filter_map(move |i| seq.position(i).cloned()))
            .collect();
        self.state.set_current(records);
    }
}

impl<Op: SeqProducer> Operator for MinseqOp<Op> {
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

impl<Op: SeqProducer> SeqProducer for MinseqOp<Op> {
    fn get_sequence_list(&self) -> &[Sequence] {
        &self.sequence_list
    }
}

pub struct MaxseqOp<Op> {
    operand: Op,
    max_len: usize,
    sequence_list: Vec<Sequence>,
    state: OperatorState,
}

impl<Op: SeqProducer> MaxseqOp<Op> {
    #[must_use]
    pub const fn new(operand: Op, max_len: usize) -> Self {
        Self { operand, max_len, sequence_list: Vec::new(), state: OperatorState::new() }
    }

    pub fn run(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        self.sequence_list = self.operand.get_sequence_list().iter().filter(|s| s.len() <= self.max_len).cloned().collect();
        let records = self
            .sequence_list
            .iter()
            .flat_map(|seq| (0..seq.len()).filter_map(move |i| seq.position(i).cloned()))
            .collect();
        self.state.set_current(records);
    }
}

impl<Op: SeqProducer> Operator for MaxseqOp<Op> {
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

impl<Op: SeqProducer> SeqProducer for MaxseqOp<Op> {
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
    use crate::record::Record;
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
    fn minseq_drops_short_sequences() {
        let mut seq_op = make_seq_op();
        seq_op.tick(0, alloc::vec![rec(1, 1), rec(2, 1)]);
        seq_op.tick(1, alloc::vec![rec(1, 2)]);
        let mut minseq = MinseqOp::new(seq_op, 2);
        minseq.run(1);
        assert_eq!(minseq.get_sequence_list().len(), 1);
        assert_eq!(minseq.get_sequence_list()[0].len(), 2);
    }

    #[test]
    fn maxseq_drops_long_sequences() {
        let mut seq_op = make_seq_op();
        seq_op.tick(0, alloc::vec![rec(1, 1), rec(2, 1)]);
        seq_op.tick(1, alloc::vec![rec(1, 2)]);
        let mut maxseq = MaxseqOp::new(seq_op, 1);
        maxseq.run(1);
        assert_eq!(maxseq.get_sequence_list().len(), 1);
        assert_eq!(maxseq.get_sequence_list()[0].len(), 1);
    }
}
