//! A minimal push-fed stream source: every record handed to it on a tick
//! is reported as inserted, nothing is ever reported as deleted. The full
//! relational operator set (projection, selection, join, window, table
//! storage) that would normally produce a stream is out of scope; this
//! is just enough connective tissue to drive `SeqOp` from caller-supplied
//! records.
//!
//! Ground truth: `operators/stream.py::StreamInsertOp`.

use alloc::vec::Vec;

use crate::attribute::Attribute;
use crate::operator::{Operator, OperatorState, ResultKind};
use crate::record::Record;

pub struct RecordStream {
    attribute_list: Vec<Attribute>,
    state: OperatorState,
}

impl RecordStream {
    #[must_use]
    pub fn new(attribute_list: Vec<Attribute>) -> Self {
        Self { attribute_list, state: OperatorState::new() }
    }

    /// Advances to `timestamp` carrying `records` as this tick's content.
    pub fn run(&mut self, timestamp: i64, records: Vec<Record>) {
        if self.state.can_run(timestamp, &[]) {
            self.state.set_current(records);
        }
    }
}

impl Operator for RecordStream {
    fn state(&self) -> &OperatorState {
        &self.state
    }

    fn get_attribute_list(&self) -> &[Attribute] {
        &self.attribute_list
    }

    fn get_result_type(&self) -> ResultKind {
        ResultKind::Stream
    }

    fn get_inserted_list(&self) -> Vec<Record> {
        self.state.current_list().to_vec()
    }

    fn get_deleted_list(&self) -> Vec<Record> {
        Vec::new()
    }
}
