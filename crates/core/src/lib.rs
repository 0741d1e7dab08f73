//! Continuous-query engine over relational streams and tables with
//! conditional preferences.
//!
//! `streampref_core` evaluates **conditional preference (CP) rules** and
//! their temporal extension (**TCP rules**) against ticking streams of
//! records, producing best/top-k results either per-record or per-sequence:
//!
//! 1. A **CP-theory** / **TCP-theory** engine: rule consistency checking
//!    (global and local acyclicity), essential-comparison synthesis, and
//!    record/sequence dominance tests.
//! 2. A **best/top-k engine** over records using five interchangeable
//!    strategies: depth-search, partition, and three incremental
//!    hierarchies (ancestors, partition, graph).
//! 3. The **temporal** extension over identified sequences, including the
//!    **SeqTree** index with optional pruning that maintains dominance
//!    hierarchies incrementally per prefix node.
//! 4. The **sequence data model** and the operators SEQ / CONSEQ / ENDSEQ /
//!    MINSEQ / MAXSEQ that produce sequences and sub-sequences from
//!    timestamped streams.
//!
//! Out of scope: the CQL-like grammar and parser, environment-file
//! loading, the tick scheduler/manager, CSV input/output, and the simple
//! relational operators (projection, selection, join, window,
//! stream-delete/insert/relation, bag union/intersect/except) -- their
//! only contract with this crate is the record-list interface exposed by
//! [`operator::Operator`].
//!
//! # Crate features
//!
//! - **`serde`** -- enables `Serialize`/`Deserialize` derives on the data
//!   model types ([`Value`], [`Attribute`], [`Record`], [`Interval`],
//!   [`Formula`], [`Comparison`], the rule and sequence types).
//!
//! This crate is `no_std` compatible (requires `alloc`).

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod attribute;
pub mod comparison;
pub mod error;
pub mod formula;
pub mod graph;
pub mod hierarchy;
pub mod interval;
pub mod operator;
pub mod record;
pub mod rule;
pub mod seqtree;
pub mod sequence;
pub mod theory;
pub mod value;

pub use attribute::Attribute;
pub use comparison::Comparison;
pub use formula::Formula;
pub use interval::Interval;
pub use record::Record;
pub use sequence::Sequence;
pub use theory::{CpTheory, TcpTheory};
pub use value::Value;
