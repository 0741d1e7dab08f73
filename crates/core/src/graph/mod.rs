//! Generic directed-graph utilities used by consistency checking.

pub mod digraph;

pub use digraph::DiGraph;
