//! Synthetic record-stream generation for benchmarking and demoing
//! `streampref_core` without a parser front-end.

pub mod generator;
