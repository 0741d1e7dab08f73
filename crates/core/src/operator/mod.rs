//! Tick-driven operator framework (§4.9): the `can_run`/`run` contract
//! every operator shares, plus the sequence, preference, and
//! temporal-preference operators built on top of it.
//!
//! Ground truth: `operators/basic.py::Operator`/`UnaryOp`.

pub mod conseq;
mod diff;
pub mod endseq;
pub mod minmaxseq;
pub mod preference_op;
pub mod seq;
pub mod source;
pub mod temporal_preference_op;
pub mod window;

pub use conseq::ConseqOp;
pub use endseq::EndseqOp;
pub use minmaxseq::{MaxseqOp, MinseqOp};
pub use preference_op::{PreferenceAlgorithm, PreferenceOp};
pub use seq::SeqOp;
pub use source::RecordStream;
pub use temporal_preference_op::{SequencePreferenceAlgorithm, TemporalPreferenceOp};
pub use window::window_bounds;

use alloc::vec::Vec;

use crate::attribute::Attribute;
use crate::record::{bag_except, Record};
use crate::sequence::Sequence;

/// Whether an operator's output is read continuously (`STREAM`) or as a
/// materialized snapshot (`TABLE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Stream,
    Table,
}

/// The per-tick bookkeeping `can_run`/`run` share: the current and
/// previous record lists, and the timestamp this operator last ran at.
///
/// Ground truth: `Operator.__init__`'s `_timestamp`/`_current_list`/
/// `_previous_list` fields plus `Operator.can_run`.
#[derive(Debug, Clone)]
pub struct OperatorState {
    timestamp: i64,
    current_list: Vec<Record>,
    previous_list: Vec<Record>,
}

impl Default for OperatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorState {
    #[must_use]
    pub const fn new() -> Self {
        Self { timestamp: -1, current_list: Vec::new(), previous_list: Vec::new() }
    }

    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub fn current_list(&self) -> &[Record] {
        &self.current_list
    }

    #[must_use]
    pub fn inserted_list(&self) -> Vec<Record> {
        bag_except(&self.current_list, &self.previous_list)
    }

    #[must_use]
    pub fn deleted_list(&self) -> Vec<Record> {
        bag_except(&self.previous_list, &self.current_list)
    }

    pub fn set_current(&mut self, records: Vec<Record>) {
        self.current_list = records;
    }

    /// Refuses to re-run a timestamp already reached, and only proceeds
    /// once every operand named in `operand_timestamps` has caught up to
    /// `timestamp`. On success, freezes `current_list` into
    /// `previous_list` and advances this operator's own timestamp --
    /// after this point `inserted_list`/`deleted_list` compare against
    /// the list the *caller* is about to build via `set_current`.
    pub fn can_run(&mut self, timestamp: i64, operand_timestamps: &[i64]) -> bool {
        if self.timestamp >= timestamp {
            return false;
        }
        if operand_timestamps.iter().any(|&t| t != timestamp) {
            return false;
        }
        self.previous_list = core::mem::take(&mut self.current_list);
        self.timestamp = timestamp;
        true
    }
}

/// Shared contract for every operator in the engine (§6).
///
/// `get_inserted_list`/`get_deleted_list` are always multiset differences
/// of the previous and current tick's record lists, computed lazily from
/// [`OperatorState`] rather than cached -- table/projection operators
/// that override this with cheaper incremental bookkeeping are out of
/// scope here, but the trait default is what every in-scope operator
/// (SEQ, CONSEQ, ENDSEQ, MINSEQ, MAXSEQ, `PreferenceOp`,
/// `TemporalPreferenceOp`) relies on.
pub trait Operator {
    fn state(&self) -> &OperatorState;

    fn get_attribute_list(&self) -> &[Attribute];

    fn get_result_type(&self) -> ResultKind {
        ResultKind::Table
    }

    fn is_consistent(&self) -> bool {
        true
    }

    fn get_current_list(&self) -> &[Record] {
        self.state().current_list()
    }

    fn get_inserted_list(&self) -> Vec<Record> {
        self.state().inserted_list()
    }

    fn get_deleted_list(&self) -> Vec<Record> {
        self.state().deleted_list()
    }

    fn get_timestamp(&self) -> i64 {
        self.state().timestamp()
    }
}

/// An [`Operator`] whose current output is a list of live sequences
/// rather than plain records -- `SeqOp` and everything built on it
/// (CONSEQ/ENDSEQ/MIN/MAXSEQ).
///
/// Ground truth: `operators/sequence.py::GenericSeqOp`.
pub trait SeqProducer: Operator {
    fn get_sequence_list(&self) -> &[Sequence];
}
