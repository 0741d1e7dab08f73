//! Conditional preference rules: `IF <condition> THEN A: I+ > I- [W]`.
//!
//! Ground truth: `preference/rule.py::CPRule`.

use hashbrown::{HashMap, HashSet};

use crate::attribute::Attribute;
use crate::error::RuleError;
use crate::formula::Formula;
use crate::interval::Interval;
use crate::record::Record;
use crate::rule::condition::Condition;
use crate::rule::preference::Preference;

/// A single CP-rule.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct CpRule {
    condition: Condition,
    preference: Preference,
}

impl CpRule {
    #[must_use]
    pub fn new(condition: Condition, preference: Preference) -> Self {
        Self { condition, preference }
    }

    #[must_use]
    pub const fn condition(&self) -> &Condition {
        &self.condition
    }

    #[must_use]
    pub const fn preference(&self) -> &Preference {
        &self.preference
    }

    /// §4.3 invariants: the preference attribute is absent from the
    /// condition and from its own indifferent set, and the indifferent
    /// set is disjoint from the condition's attributes.
    ///
    /// # Errors
    /// Returns the first invariant violated, as a [`RuleError`].
    pub fn is_consistent(&self) -> Result<(), RuleError> {
        let pref_attr = self.preference.attribute();
        if self.condition.formula().contains_attr(pref_attr) {
            return Err(RuleError::PreferenceAttributeInCondition { attribute: pref_attr.clone() });
        }
        if self.preference.indifferent_set().contains(pref_attr) {
            return Err(RuleError::PreferenceAttributeInIndifferentSet {
                attribute: pref_attr.clone(),
            });
        }
        for attr in self.preference.indifferent_set() {
            if self.condition.formula().contains_attr(attr) {
                return Err(RuleError::IndifferentSetOverlapsCondition { attribute: attr.clone() });
            }
        }
        Ok(())
    }

    /// Attributes mentioned anywhere in the rule.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.condition
            .attributes()
            .chain(self.preference.indifferent_set().iter())
            .chain(core::iter::once(self.preference.attribute()))
    }

    /// Intervals constraining `attribute` anywhere in the rule, used to
    /// drive [`Self::split`].
    #[must_use]
    pub fn intervals_for(&self, attribute: &Attribute) -> alloc::vec::Vec<Interval> {
        let mut out = alloc::vec::Vec::new();
        if let Some(iv) = self.condition.formula().get(attribute) {
            out.push(iv.clone());
        }
        if self.preference.attribute() == attribute {
            out.push(self.preference.best().clone());
            out.push(self.preference.worst().clone());
        }
        out
    }

    /// Split the condition's proposition on `attribute`, if `interval`
    /// properly overlaps it; else try the preference's best/worst
    /// intervals. Returns the replacement rules, or empty if nothing
    /// overlapped.
    ///
    /// Ground truth: `CPRule._split_by_interval`.
    #[must_use]
    pub fn split_by_interval(&self, attribute: &Attribute, interval: &Interval) -> alloc::vec::Vec<Self> {
        if let Some(cond_interval) = self.condition.formula().get(attribute) {
            let pieces = cond_interval.split_by(interval);
            if !pieces.is_empty() {
                return pieces
                    .into_iter()
                    .map(|piece| {
                        let mut formula = self.condition.formula().clone();
                        formula.set(attribute.clone(), piece);
                        Self::new(Condition::new(formula), self.preference.clone())
                    })
                    .collect();
            }
        }
        if self.preference.attribute() == attribute {
            let best_pieces = self.preference.best().split_by(interval);
            if !best_pieces.is_empty() {
                return best_pieces
                    .into_iter()
                    .map(|piece| {
                        let pref = Preference::new(
                            attribute.clone(),
                            piece,
                            self.preference.worst().clone(),
                            self.preference.indifferent_set().clone(),
                        );
                        Self::new(self.condition.clone(), pref)
                    })
                    .collect();
            }
            let worst_pieces = self.preference.worst().split_by(interval);
            if !worst_pieces.is_empty() {
                return worst_pieces
                    .into_iter()
                    .map(|piece| {
                        let pref = Preference::new(
                            attribute.clone(),
                            self.preference.best().clone(),
                            piece,
                            self.preference.indifferent_set().clone(),
                        );
                        Self::new(self.condition.clone(), pref)
                    })
                    .collect();
            }
        }
        alloc::vec::Vec::new()
    }

    /// Split `self` against every interval mentioned by `other`, on a
    /// matching attribute; stops at the first attribute/interval that
    /// actually splits.
    ///
    /// Ground truth: `CPRule.split`.
    #[must_use]
    pub fn split(&self, other: &Self) -> alloc::vec::Vec<Self> {
        let mut seen: HashSet<Attribute> = HashSet::new();
        for attr in other.attributes() {
            if !seen.insert(attr.clone()) {
                continue;
            }
            for interval in other.intervals_for(attr) {
                let pieces = self.split_by_interval(attr, &interval);
                if !pieces.is_empty() {
                    return pieces;
                }
            }
        }
        alloc::vec::Vec::new()
    }

    /// `record`, if it satisfies the condition and is not already worse
    /// than the preference's best interval, demoted to the worst
    /// interval and stripped of indifferent attributes.
    ///
    /// Ground truth: `CPRule.change_record`, which writes
    /// `pref.get_worst_interval()` -- the whole interval, not a boundary
    /// value -- into the demoted record's preference attribute.
    #[must_use]
    pub fn change_record(&self, record: &SearchRecord) -> Option<SearchRecord> {
        let pref_attr = self.preference.attribute();
        if !self.condition.is_valid_by_record(record.record()) {
            return None;
        }
        if let Some(v) = record.record().get(pref_attr) {
            if !self.preference.best().is_inside_or_equal(v) {
                return None;
            }
        }
        let mut next = record.clone();
        next.demote(pref_attr.clone(), self.preference.worst().clone());
        for attr in self.preference.indifferent_set() {
            next.remove(attr);
        }
        Some(next)
    }

    /// `formula1` dominates `formula2` under this rule: `formula1` hits
    /// the best interval, `formula2` the worst, both satisfy the
    /// condition, and every other attribute agrees.
    ///
    /// Ground truth: `CPRule.formula_dominates`.
    #[must_use]
    pub fn formula_dominates(&self, formula1: &Formula, formula2: &Formula) -> bool {
        let pref = &self.preference;
        if !matches_interval(formula1, pref.attribute(), pref.best())
            || !matches_interval(formula2, pref.attribute(), pref.worst())
        {
            return false;
        }
        if !is_formula_valid_by_condition(&self.condition, formula1)
            || !is_formula_valid_by_condition(&self.condition, formula2)
        {
            return false;
        }
        all_other_attributes_agree_formula(formula1, formula2, pref.attribute(), pref.indifferent_set())
    }

    /// `record1` dominates `record2` under this rule.
    ///
    /// Ground truth: `CPRule.record_dominates`.
    #[must_use]
    pub fn record_dominates(&self, record1: &Record, record2: &Record) -> bool {
        let pref = &self.preference;
        let best_ok = record1.get(pref.attribute()).is_some_and(|v| pref.best().is_inside_or_equal(v));
        let worst_ok = record2.get(pref.attribute()).is_some_and(|v| pref.worst().is_inside_or_equal(v));
        if !best_ok || !worst_ok {
            return false;
        }
        if !self.condition.is_valid_by_record(record1) || !self.condition.is_valid_by_record(record2) {
            return false;
        }
        let mut all_attrs: HashSet<&Attribute> = HashSet::new();
        all_attrs.extend(record1.attributes());
        all_attrs.extend(record2.attributes());
        for attr in all_attrs {
            if attr == pref.attribute() || pref.indifferent_set().contains(attr) {
                continue;
            }
            match (record1.get(attr), record2.get(attr)) {
                (Some(v1), Some(v2)) if v1 == v2 => {}
                _ => return false,
            }
        }
        true
    }
}

/// A record mid depth-search dominance.
///
/// Attributes untouched by a rule application keep their literal value;
/// an attribute demoted by [`CpRule::change_record`] carries the rule's
/// worst interval instead, so a later goal check can test containment
/// against it rather than equality against a collapsed boundary value.
///
/// Ground truth: `CPRule.change_record` stores the worst `Interval`
/// object directly in the record dict in place of a literal value;
/// `is_goal_record` (`preference/theory.py`) special-cases
/// `isinstance(goal_value, Interval)` to recover it.
#[derive(Debug, Clone)]
pub struct SearchRecord {
    record: Record,
    demoted: HashMap<Attribute, Interval>,
}

impl SearchRecord {
    #[must_use]
    pub fn from_record(record: Record) -> Self {
        Self {
            record,
            demoted: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn record(&self) -> &Record {
        &self.record
    }

    /// The worst interval an earlier rule application left on `attr`, if any.
    #[must_use]
    pub fn demotion(&self, attr: &Attribute) -> Option<&Interval> {
        self.demoted.get(attr)
    }

    pub fn demotions(&self) -> impl Iterator<Item = (&Attribute, &Interval)> {
        self.demoted.iter()
    }

    fn demote(&mut self, attr: Attribute, worst: Interval) {
        self.record.remove(&attr);
        self.demoted.insert(attr, worst);
    }

    fn remove(&mut self, attr: &Attribute) {
        self.record.remove(attr);
        self.demoted.remove(attr);
    }
}

fn matches_interval(formula: &Formula, attribute: &Attribute, interval: &Interval) -> bool {
    formula.get(attribute).is_some_and(|iv| iv == interval)
}

fn is_formula_valid_by_condition(condition: &Condition, formula: &Formula) -> bool {
    for attr in condition.formula().attributes() {
        match (formula.get(attr), condition.formula().get(attr)) {
            (Some(a), Some(b)) if a == b => {}
            _ => return false,
        }
    }
    true
}

fn all_other_attributes_agree_formula(
    f1: &Formula,
    f2: &Formula,
    exclude: &Attribute,
    indifferent: &HashSet<Attribute>,
) -> bool {
    let mut all_attrs: HashSet<&Attribute> = HashSet::new();
    all_attrs.extend(f1.attributes());
    all_attrs.extend(f2.attributes());
    for attr in all_attrs {
        if attr == exclude || indifferent.contains(attr) {
            continue;
        }
        match (f1.get(attr), f2.get(attr)) {
            (Some(a), Some(b)) if a == b => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn rule() -> CpRule {
        let cond = Condition::new(Formula::new().with(attr("a"), Interval::one_sided("=", Value::Int(1))));
        let pref = Preference::new(
            attr("b"),
            Interval::one_sided("=", Value::Int(1)),
            Interval::one_sided("=", Value::Int(0)),
            HashSet::new(),
        );
        CpRule::new(cond, pref)
    }

    #[test]
    fn consistent_rule_passes() {
        assert!(rule().is_consistent().is_ok());
    }

    #[test]
    fn inconsistent_when_preference_attribute_in_condition() {
        let cond = Condition::new(Formula::new().with(attr("b"), Interval::one_sided("=", Value::Int(1))));
        let pref = Preference::new(
            attr("b"),
            Interval::one_sided("=", Value::Int(1)),
            Interval::one_sided("=", Value::Int(0)),
            HashSet::new(),
        );
        let bad = CpRule::new(cond, pref);
        assert!(bad.is_consistent().is_err());
    }

    #[test]
    fn change_record_demotes_and_strips_indifferent() {
        let cond = Condition::new(Formula::new());
        let indiff: HashSet<Attribute> = [attr("c")].into_iter().collect();
        let pref = Preference::new(
            attr("b"),
            Interval::one_sided("=", Value::Int(1)),
            Interval::one_sided("=", Value::Int(0)),
            indiff,
        );
        let r = CpRule::new(cond, pref);
        let mut record = Record::new();
        record.set(attr("a"), Value::Int(1));
        record.set(attr("b"), Value::Int(1));
        record.set(attr("c"), Value::Int(9));
        let changed = r.change_record(&SearchRecord::from_record(record)).unwrap();
        assert_eq!(changed.demotion(&attr("b")), Some(&Interval::one_sided("=", Value::Int(0))));
        assert!(!changed.record().contains(&attr("b")));
        assert!(!changed.record().contains(&attr("c")));
    }

    #[test]
    fn record_dominates_matches_rule_shape() {
        let r = rule();
        let mut r1 = Record::new();
        r1.set(attr("a"), Value::Int(1));
        r1.set(attr("b"), Value::Int(1));
        let mut r2 = Record::new();
        r2.set(attr("a"), Value::Int(1));
        r2.set(attr("b"), Value::Int(0));
        assert!(r.record_dominates(&r1, &r2));
    }
}
