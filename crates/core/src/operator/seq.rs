//! `SEQ[range, slide]`: groups a stream of records into one growing
//! [`Sequence`] per identifier, windowing positions by `window_bounds`.
//!
//! Ground truth: `operators/sequence.py::SeqOp`.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::attribute::Attribute;
use crate::operator::window::window_bounds;
use crate::operator::{Operator, OperatorState, ResultKind, SeqProducer};
use crate::record::Record;
use crate::sequence::Sequence;

pub struct SeqOp<Op> {
    operand: Op,
    attribute_list: Vec<Attribute>,
    identifier_attributes: Vec<Attribute>,
    record_attributes: Vec<Attribute>,
    range: i64,
    slide: i64,
    sequences: HashMap<Record, Sequence>,
    sequence_list: Vec<Sequence>,
    state: OperatorState,
}

impl<Op: Operator> SeqOp<Op> {
    /// `range == -1` means unbounded (no expiry).
    #[must_use]
    pub fn new(operand: Op, identifier_attributes: Vec<Attribute>, range: i64, slide: i64) -> Self {
        let record_attributes: Vec<Attribute> = operand
            .get_attribute_list()
            .iter()
            .filter(|a| !identifier_attributes.contains(a))
            .cloned()
            .collect();
        let attribute_list = operand.get_attribute_list().to_vec();
        Self {
            operand,
            attribute_list,
            identifier_attributes,
            record_attributes,
            range,
            slide,
            sequences: HashMap::new(),
            sequence_list: Vec::new(),
            state: OperatorState::new(),
        }
    }

    fn add_records(&mut self, records: &[Record], timestamp: i64, start: i64, end: i64) {
        for rec in records {
            let id = rec.project(&self.identifier_attributes);
            let body = rec.project(&self.record_attributes);
            self.sequences
                .entry(id.clone())
                .or_insert_with(|| Sequence::with_identifier(id))
                .append_position(body, timestamp, start, end);
        }
    }

    fn delete_expired(&mut self, timestamp: i64) {
        self.sequences.retain(|_, seq| {
            seq.delete_expired_positions(timestamp);
            !seq.is_empty()
        });
    }

    pub fn run(&mut self, timestamp: i64) {
        if !self.state.can_run(timestamp, &[self.operand.get_timestamp()]) {
            return;
        }
        if self.range == -1 {
            let inserted = self.operand.get_inserted_list();
            self.add_records(&inserted, timestamp, -1, -1);
        } else {
            self.delete_expired(timestamp);
            let (start, end) = window_bounds(timestamp, self.range, self.slide);
            if start <= timestamp && timestamp <= end {
                let inserted = self.operand.get_inserted_list();
                self.add_records(&inserted, timestamp, start, end);
            }
        }
        self.sequence_list = self.sequences.values().cloned().collect();
        let current = self.sequence_list.iter().flat_map(|seq| (0..seq.len()).filter_map(move |i| seq.position(i).cloned())).collect();
        self.state.set_current(current);
        tracing::debug!(timestamp, sequences = self.sequence_list.len(), "SEQ tick");
    }
}

impl<Op: Operator> Operator for SeqOp<Op> {
    fn state(&self) -> &OperatorState {
        &self.state
    }

    fn get_attribute_list(&self) -> &[Attribute] {
        &self.attribute_list
    }

    fn get_result_type(&self) -> ResultKind {
        ResultKind::Table
    }

    fn is_consistent(&self) -> bool {
        self.operand.get_result_type() == ResultKind::Stream && !self.identifier_attributes.is_empty()
    }
}

impl<Op: Operator> SeqProducer for SeqOp<Op> {
    fn get_sequence_list(&self) -> &[Sequence] {
        &self.sequence_list
    }
}

impl SeqOp<crate::operator::source::RecordStream> {
    /// Feeds `records` into the underlying stream source for this tick
    /// and runs. Convenience for driving a SEQ chain straight off
    /// caller-supplied records, without wiring a separate source handle.
    pub fn tick(&mut self, timestamp: i64, records: Vec<Record>) {
        self.operand.run(timestamp, records);
        self.run(timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;
    use crate::operator::source::RecordStream;
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

    #[test]
    fn groups_records_by_identifier_into_separate_sequences() {
        let mut source = RecordStream::new(alloc::vec![attr("id"), attr("v")]);
        source.run(0, alloc::vec![rec(1, 10), rec(2, 20)]);
        let mut seq_op = SeqOp::new(source, alloc::vec![attr("id")], 10, 1);
        seq_op.run(0);
        assert_eq!(seq_op.get_sequence_list().len(), 2);
    }

    #[test]
    fn unbounded_range_never_expires_positions() {
        let mut source = RecordStream::new(alloc::vec![attr("id"), attr("v")]);
        source.run(0, alloc::vec![rec(1, 10)]);
        let mut seq_op = SeqOp::new(source, alloc::vec![attr("id")], -1, -1);
        seq_op.run(0);
        assert_eq!(seq_op.get_sequence_list()[0].len(), 1);
    }
}
