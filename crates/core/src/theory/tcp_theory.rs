//! Temporal conditional preference theories: a consistent set of
//! TCP-rules plus a sequence-level dominance test.
//!
//! Ground truth: `preference/theory.py::TCPTheory`.

use alloc::vec::Vec;

use crate::error::TheoryError;
use crate::rule::TcpRule;
use crate::sequence::Sequence;
use crate::theory::cp_theory::{Algorithm, CpTheory};

/// A consistent set of TCP-rules.
#[derive(Debug, Clone)]
pub struct TcpTheory {
    rules: Vec<TcpRule>,
}

impl TcpTheory {
    /// Consistency holds when every maximal temporally-compatible subset
    /// of rules is consistent as a (present-tense) [`CpTheory`].
    ///
    /// # Errors
    /// Returns the first inconsistent subset's failure.
    pub fn new(rules: Vec<TcpRule>) -> Result<Self, TheoryError> {
        for set in temporal_compatible_sets(&rules) {
            let cp_rules = set.iter().map(|&i| rules[i].to_cp_rule()).collect();
            CpTheory::new(cp_rules, Algorithm::DepthSearch, false)?;
        }
        Ok(Self { rules })
    }

    #[must_use]
    pub fn rules(&self) -> &[TcpRule] {
        &self.rules
    }

    /// Rules whose condition is satisfied by `seq[pos]` (present-record
    /// check included).
    ///
    /// Ground truth: `TCPTheory.get_valid_rules`.
    #[must_use]
    pub fn valid_rules(&self, seq: &Sequence, pos: usize) -> Vec<&TcpRule> {
        self.rules.iter().filter(|r| r.is_valid_by_position(seq, pos)).collect()
    }

    /// Does `seq` dominate `goal`? Finds the first position at which they
    /// differ, builds a present-tense theory from the rules valid at that
    /// position, and tests record dominance there.
    ///
    /// Ground truth: `TCPTheory.dominates_by_search`.
    #[must_use]
    pub fn dominates_by_search(&self, seq: &Sequence, goal: &Sequence) -> bool {
        let Some(pos) = seq.first_different_position(goal) else {
            return false;
        };
        let (Some(rec), Some(goal_rec)) = (seq.position(pos), goal.position(pos)) else {
            return false;
        };
        let cp_rules = self.valid_rules(seq, pos).into_iter().map(TcpRule::to_cp_rule).collect();
        let Ok(cp_theory) = CpTheory::new(cp_rules, Algorithm::DepthSearch, true) else {
            return false;
        };
        cp_theory.dominates(rec, goal_rec)
    }
}

/// Maximal sets (by rule index) such that every pair is temporally
/// compatible.
///
/// Ground truth: `TCPTheory._get_temporal_compatible_sets`, simplified to
/// operate over indices instead of hashable rule objects.
fn temporal_compatible_sets(rules: &[TcpRule]) -> Vec<Vec<usize>> {
    let mut sets: Vec<Vec<usize>> = Vec::new();
    for (i, rule) in rules.iter().enumerate() {
        let mut set = alloc::vec![i];
        for (j, other) in rules.iter().enumerate() {
            if i != j && rule.is_temporal_compatible_to(other) {
                set.push(j);
            }
        }
        set.sort_unstable();
        if !sets.contains(&set) {
            sets.push(set);
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, DataType};
    use crate::interval::Interval;
    use crate::record::Record;
    use crate::rule::{Preference, TcpCondition, Temporal, TemporalProposition};
    use crate::value::Value;
    use hashbrown::HashSet;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn rec(v: i64) -> Record {
        let mut r = Record::new();
        r.set(attr("p"), Value::Int(v));
        r
    }

    #[test]
    fn valid_rules_respects_previous_qualifier() {
        let prop = TemporalProposition {
            qualifier: Temporal::Previous,
            attribute: attr("p"),
            interval: Interval::one_sided("=", Value::Int(1)),
        };
        let cond = TcpCondition::new(false, alloc::vec![prop]);
        let pref = Preference::new(
            attr("p"),
            Interval::one_sided("=", Value::Int(2)),
            Interval::one_sided("=", Value::Int(0)),
            HashSet::new(),
        );
        let rule = TcpRule::new(cond, pref);
        let theory = TcpTheory::new(alloc::vec![rule]).unwrap();

        let mut seq = Sequence::new();
        seq.append_position(rec(1), 0, 0, 10);
        seq.append_position(rec(2), 1, 0, 10);

        assert!(!theory.valid_rules(&seq, 1).is_empty());
        assert!(theory.valid_rules(&seq, 0).is_empty());
    }
}
