//! Comparisons: `(f+, f-, W)` dominance primitives over record pairs.

use alloc::string::String;
use core::cmp::Ordering;

use hashbrown::HashSet;

use crate::attribute::Attribute;
use crate::formula::Formula;
use crate::record::Record;

/// `b = (f+, f-, W)`. `b.dominates(r1, r2)` iff `r1` satisfies `f+`, `r2`
/// satisfies `f-`, and every attribute outside `W u dom(f+) u dom(f-)`
/// agrees between `r1` and `r2`.
///
/// Grounded in `preference/comparison.py::Comparison`.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Comparison {
    best: Formula,
    worst: Formula,
    indifferent: HashSet<Attribute>,
}

impl Comparison {
    #[must_use]
    pub fn new(best: Formula, worst: Formula, indifferent: HashSet<Attribute>) -> Self {
        Self {
            best,
            worst,
            indifferent,
        }
    }

    #[must_use]
    pub const fn best(&self) -> &Formula {
        &self.best
    }

    #[must_use]
    pub const fn worst(&self) -> &Formula {
        &self.worst
    }

    #[must_use]
    pub const fn indifferent_set(&self) -> &HashSet<Attribute> {
        &self.indifferent
    }

    #[must_use]
    pub fn is_best_record(&self, record: &Record) -> bool {
        self.best.is_satisfied_by(record)
    }

    #[must_use]
    pub fn is_worst_record(&self, record: &Record) -> bool {
        self.worst.is_satisfied_by(record)
    }

    /// `r1` dominates `r2` under this comparison.
    #[must_use]
    pub fn dominates(&self, r1: &Record, r2: &Record) -> bool {
        if !self.is_best_record(r1) || !self.is_worst_record(r2) {
            return false;
        }
        let mut all_attrs: HashSet<&Attribute> = HashSet::new();
        all_attrs.extend(r1.attributes());
        all_attrs.extend(r2.attributes());
        for attr in all_attrs {
            if self.indifferent.contains(attr) {
                continue;
            }
            match (r1.get(attr), r2.get(attr)) {
                (Some(v1), Some(v2)) if v1 == v2 => {}
                _ => return false,
            }
        }
        true
    }

    /// Is `self` more generic than `other`?
    ///
    /// `self: f+ > f- [W]`, `other: g+^a+ > g-^a- [W2]`, where `a+`/`a-`
    /// are `other`'s extra propositions relative to `self`. `true` when
    /// either:
    /// 1. `a+ == a-` and `W2 subset W`, or
    /// 2. `(dom(a+) u W2) subset W` and `(dom(a-) u W2) subset W`.
    ///
    /// Ground truth: `preference/comparison.py::is_more_generic_than`.
    #[must_use]
    pub fn is_more_generic_than(&self, other: &Self) -> bool {
        let a_pref = other.best.difference(&self.best);
        let a_notpref = other.worst.difference(&self.worst);
        let g_pref = other.best.difference(&a_pref);
        let g_notpref = other.worst.difference(&a_notpref);

        if g_pref != self.best || g_notpref != self.worst {
            return false;
        }

        if a_pref == a_notpref && other.indifferent.is_subset(&self.indifferent) {
            return true;
        }

        let aw2_pref: HashSet<Attribute> = other
            .indifferent
            .iter()
            .cloned()
            .chain(a_pref.attributes().cloned())
            .collect();
        let aw2_notpref: HashSet<Attribute> = other
            .indifferent
            .iter()
            .cloned()
            .chain(a_notpref.attributes().cloned())
            .collect();

        aw2_pref.is_subset(&self.indifferent) && aw2_notpref.is_subset(&self.indifferent)
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut indiff: alloc::vec::Vec<String> =
            self.indifferent.iter().map(alloc::string::ToString::to_string).collect();
        indiff.sort();
        alloc::format!("{} > {}[{}]", self.best.render(), self.worst.render(), indiff.join(","))
    }
}

impl PartialEq for Comparison {
    fn eq(&self, other: &Self) -> bool {
        self.render() == other.render()
    }
}
impl Eq for Comparison {}

/// Stability ordering for essential-comparison pruning: descending
/// indifferent-set size, then ascending combined formula size.
///
/// Ground truth: `Comparison.__cmp__`.
pub fn compare_stability(a: &Comparison, b: &Comparison) -> Ordering {
    let by_indiff = b.indifferent.len().cmp(&a.indifferent.len());
    if by_indiff != Ordering::Equal {
        return by_indiff;
    }
    let a_size = a.best.len() + a.worst.len();
    let b_size = b.best.len() + b.worst.len();
    a_size.cmp(&b_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;
    use crate::interval::Interval;
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn rec(pairs: &[(&str, i64)]) -> Record {
        let mut r = Record::new();
        for (name, v) in pairs {
            r.set(attr(name), Value::Int(*v));
        }
        r
    }

    #[test]
    fn dominates_requires_best_worst_and_equal_elsewhere() {
        let best = Formula::new().with(attr("b"), Interval::one_sided("=", Value::Int(2)));
        let worst = Formula::new().with(attr("b"), Interval::one_sided("=", Value::Int(3)));
        let indiff: HashSet<Attribute> = [attr("c")].into_iter().collect();
        let comp = Comparison::new(best, worst, indiff);

        let r1 = rec(&[("a", 1), ("b", 2), ("c", 5)]);
        let r2 = rec(&[("a", 1), ("b", 3), ("c", 9)]);
        assert!(comp.dominates(&r1, &r2));

        let r3 = rec(&[("a", 2), ("b", 3), ("c", 9)]);
        assert!(!comp.dominates(&r1, &r3));
    }

    #[test]
    fn more_generic_prunes_extra_attribute() {
        // R1: x=1 > x=2 ()
        let r1 = Comparison::new(
            Formula::new().with(attr("x"), Interval::one_sided("=", Value::Int(1))),
            Formula::new().with(attr("x"), Interval::one_sided("=", Value::Int(2))),
            HashSet::new(),
        );
        // R2: x=1^y=7 > x=2^y=7 ()
        let r2 = Comparison::new(
            Formula::new()
                .with(attr("x"), Interval::one_sided("=", Value::Int(1)))
                .with(attr("y"), Interval::one_sided("=", Value::Int(7))),
            Formula::new()
                .with(attr("x"), Interval::one_sided("=", Value::Int(2)))
                .with(attr("y"), Interval::one_sided("=", Value::Int(7))),
            HashSet::new(),
        );
        assert!(r1.is_more_generic_than(&r2));
    }
}
