//! Conditional preference theories over records (§4.4) and over sequences
//! (§4.8's temporal counterpart).

pub mod cp_theory;
pub mod tcp_theory;

pub use cp_theory::{Algorithm, CpTheory};
pub use tcp_theory::TcpTheory;
