//! Formulas: conjunctions of attribute=interval propositions.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::attribute::Attribute;
use crate::interval::Interval;
use crate::record::Record;

/// A conjunction of `attribute -> interval` propositions.
///
/// Equality is attribute-wise interval equality, matching the Python
/// `Comparison.__eq__`'s reliance on the rendered string for identity;
/// here we derive `PartialEq` directly over the sorted map instead of
/// going through a string, which is equivalent and avoids allocation on
/// every comparison.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formula {
    propositions: HashMap<Attribute, Interval>,
}

impl Formula {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, attr: Attribute, interval: Interval) -> Self {
        self.propositions.insert(attr, interval);
        self
    }

    pub fn set(&mut self, attr: Attribute, interval: Interval) {
        self.propositions.insert(attr, interval);
    }

    #[must_use]
    pub fn get(&self, attr: &Attribute) -> Option<&Interval> {
        self.propositions.get(attr)
    }

    #[must_use]
    pub fn contains_attr(&self, attr: &Attribute) -> bool {
        self.propositions.contains_key(attr)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.propositions.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Attribute, &Interval)> {
        self.propositions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.propositions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.propositions.is_empty()
    }

    /// A formula is satisfied by a record iff every mapped attribute's
    /// record value lies in its interval.
    #[must_use]
    pub fn is_satisfied_by(&self, record: &Record) -> bool {
        self.propositions.iter().all(|(attr, interval)| {
            record
                .get(attr)
                .is_some_and(|value| interval.is_inside_or_equal(value))
        })
    }

    /// Attributions present in `self` but not in `other` -- ground truth:
    /// `get_difference_formula(big_formula, small_formula)`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut result = Self::new();
        for (attr, interval) in &self.propositions {
            if !other.propositions.contains_key(attr) {
                result.set(attr.clone(), interval.clone());
            }
        }
        result
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for (attr, interval) in &other.propositions {
            result.propositions.entry(attr.clone()).or_insert_with(|| interval.clone());
        }
        result
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = self
            .propositions
            .iter()
            .map(|(attr, interval)| interval.render(attr))
            .collect();
        parts.sort();
        alloc::format!("({})", parts.join(")^("))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    #[test]
    fn satisfied_by_checks_every_proposition() {
        let formula = Formula::new().with(attr("a"), Interval::one_sided("=", Value::Int(1)));
        let mut r = Record::new();
        r.set(attr("a"), Value::Int(1));
        assert!(formula.is_satisfied_by(&r));
        r.set(attr("a"), Value::Int(2));
        assert!(!formula.is_satisfied_by(&r));
    }

    #[test]
    fn difference_drops_shared_attributes() {
        let big = Formula::new()
            .with(attr("a"), Interval::one_sided("=", Value::Int(1)))
            .with(attr("b"), Interval::one_sided("=", Value::Int(2)));
        let small = Formula::new().with(attr("a"), Interval::one_sided("=", Value::Int(9)));
        let diff = big.difference(&small);
        assert!(!diff.contains_attr(&attr("a")));
        assert!(diff.contains_attr(&attr("b")));
    }
}
