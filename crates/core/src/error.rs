//! Crate-wide error types.
//!
//! Only registration/construction-time failures are represented here.
//! Invalid-record conditions at tick time (deleting an absent record) are
//! logged via `tracing::warn!` and ignored rather than returned, per §7.

use alloc::string::String;

use derive_more::From;

use crate::attribute::Attribute;

/// A rule violates one of the CP-rule/TCP-rule invariants from §3/§4.3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The preference attribute also appears in the condition.
    PreferenceAttributeInCondition { attribute: Attribute },
    /// The preference attribute appears in its own indifferent set.
    PreferenceAttributeInIndifferentSet { attribute: Attribute },
    /// The indifferent set overlaps the condition's attributes.
    IndifferentSetOverlapsCondition { attribute: Attribute },
    /// A formula attribute references an unknown or mistyped attribute.
    InvalidAttributeReference { attribute: Attribute },
}

/// A theory failed global or local consistency checking (§4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TheoryError {
    /// The condition-attribute -> preference-attribute -> indifferent-attribute
    /// digraph has a cycle.
    GlobalCycle,
    /// A maximal compatible-rule set's preferred -> non-preferred interval
    /// graph has a cycle.
    LocalCycle,
}

/// Top-level error type for registration/construction-time failures.
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum Error {
    Configuration(RuleError),
    Inconsistent(TheoryError),
    /// Requesting an unsupported algorithm id for a component -- a fatal
    /// programming error at construction, never at tick time (§7).
    AlgorithmMismatch {
        algorithm: String,
        component: &'static str,
    },
    /// The operand an operator was registered against is the wrong kind
    /// (e.g. a sequence operator over a non-sequence-producing operand).
    OperandMismatch { operator: &'static str },
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "configuration error: {e:?}"),
            Self::Inconsistent(e) => write!(f, "theory inconsistency: {e:?}"),
            Self::AlgorithmMismatch { algorithm, component } => {
                write!(f, "algorithm {algorithm} not supported by {component}")
            }
            Self::OperandMismatch { operator } => {
                write!(f, "{operator} registered against an incompatible operand")
            }
        }
    }
}
