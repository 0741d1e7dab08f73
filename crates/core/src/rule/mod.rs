//! CP-rules and TCP-rules: conditions paired with a preference.

pub mod condition;
pub mod cp;
pub mod preference;
pub mod tcp;

pub use condition::{Condition, Temporal, TcpCondition, TemporalProposition};
pub use cp::{CpRule, SearchRecord};
pub use preference::Preference;
pub use tcp::TcpRule;
