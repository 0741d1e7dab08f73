//! Rule conditions: a plain conjunction for CP-rules, a temporally
//! qualified conjunction for TCP-rules.

use crate::attribute::Attribute;
use crate::formula::Formula;
use crate::interval::Interval;
use crate::record::Record;
use crate::sequence::Sequence;

/// `IF <pred> (AND <pred>)*` -- a plain conjunction of propositions,
/// evaluated against a single record.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Condition {
    formula: Formula,
}

impl Condition {
    #[must_use]
    pub fn new(formula: Formula) -> Self {
        Self { formula }
    }

    #[must_use]
    pub const fn formula(&self) -> &Formula {
        &self.formula
    }

    #[must_use]
    pub fn is_valid_by_record(&self, record: &Record) -> bool {
        self.formula.is_satisfied_by(record)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.formula.attributes()
    }
}

/// The temporal qualifier attached to one proposition of a TCP-rule
/// condition (§6: "optional temporal prefixes ... per predicate").
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    /// Evaluated against the present (current) position.
    Present,
    /// Evaluated against `seq[pos - 1]`.
    Previous,
    /// Existential over `seq[0..pos]`.
    SomePrevious,
    /// Universal over `seq[0..pos]`.
    AllPrevious,
}

/// One temporally qualified proposition.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct TemporalProposition {
    pub qualifier: Temporal,
    pub attribute: Attribute,
    pub interval: Interval,
}

/// A TCP-rule condition: an optional `FIRST` marker plus a conjunction of
/// temporally qualified propositions.
///
/// Ground truth: `preference/rule.py::TCPCondition`.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct TcpCondition {
    first: bool,
    propositions: alloc::vec::Vec<TemporalProposition>,
}

impl TcpCondition {
    #[must_use]
    pub fn new(first: bool, propositions: alloc::vec::Vec<TemporalProposition>) -> Self {
        Self { first, propositions }
    }

    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.first
    }

    #[must_use]
    pub fn propositions(&self) -> &[TemporalProposition] {
        &self.propositions
    }

    fn proposition_holds(prop: &TemporalProposition, record: &Record) -> bool {
        record
            .get(&prop.attribute)
            .is_some_and(|v| prop.interval.is_inside_or_equal(v))
    }

    /// Evaluate present-tense propositions plus `FIRST` against
    /// `seq[pos]`, and past-tense propositions against `seq[0..pos]`.
    #[must_use]
    pub fn is_valid_by_position(&self, seq: &Sequence, pos: usize) -> bool {
        if self.first && pos != 0 {
            return false;
        }
        let Some(present) = seq.position(pos) else {
            return false;
        };
        for prop in &self.propositions {
            if prop.qualifier == Temporal::Present && !Self::proposition_holds(prop, present) {
                return false;
            }
        }
        self.is_temporal_valid_by_position(seq, pos)
    }

    /// Past-only variant: evaluates `Previous`/`SomePrevious`/`AllPrevious`
    /// propositions against `seq[0..pos]` without checking the present
    /// record. Used by SeqTree rule extraction (§4.8), where the present
    /// position is a synthetic placeholder.
    ///
    /// Ground truth: `TCPCondition.is_temporal_valid_by_position`.
    #[must_use]
    pub fn is_temporal_valid_by_position(&self, seq: &Sequence, pos: usize) -> bool {
        if self.first && pos != 0 {
            return false;
        }
        for prop in &self.propositions {
            match prop.qualifier {
                Temporal::Present => {}
                Temporal::Previous => {
                    if pos == 0 {
                        return false;
                    }
                    let Some(prev) = seq.position(pos - 1) else {
                        return false;
                    };
                    if !Self::proposition_holds(prop, prev) {
                        return false;
                    }
                }
                Temporal::SomePrevious => {
                    if pos == 0 || !(0..pos).any(|i| {
                        seq.position(i).is_some_and(|r| Self::proposition_holds(prop, r))
                    }) {
                        return false;
                    }
                }
                Temporal::AllPrevious => {
                    if !(0..pos).all(|i| {
                        seq.position(i).is_some_and(|r| Self::proposition_holds(prop, r))
                    }) {
                        return false;
                    }
                }
            }
        }
        true
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.propositions.iter().map(|p| &p.attribute)
    }
}
