//! Half-open/closed intervals of [`Value`]s.
//!
//! Faithful to `examples/original_source/preference/interval.py`: each
//! bound is independently optional and independently open/closed/equal,
//! collapsed to `=` when both bounds coincide on a closed value.

use alloc::vec::Vec;
use core::fmt;

use crate::attribute::Attribute;
use crate::value::Value;

/// A bound operator. `Eq` only ever appears when both sides of an
/// [`Interval`] carry it (normalized on construction).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundOp {
    Less,
    LessEq,
    Eq,
}

impl BoundOp {
    const fn is_closed(self) -> bool {
        matches!(self, Self::LessEq | Self::Eq)
    }
}

/// `[left_value left_op ... right_op right_value]`, either bound optional.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    left_value: Option<Value>,
    left_op: BoundOp,
    right_op: BoundOp,
    right_value: Option<Value>,
}

impl Interval {
    /// `key <op> value`: one-sided bound. `op` is one of `<`, `<=`, `=`, `>`, `>=`.
    #[must_use]
    pub fn one_sided(op: &str, value: Value) -> Self {
        match op {
            "=" => Self {
                left_value: Some(value.clone()),
                left_op: BoundOp::Eq,
                right_op: BoundOp::Eq,
                right_value: Some(value),
            },
            "<" => Self {
                left_value: None,
                left_op: BoundOp::LessEq,
                right_op: BoundOp::Less,
                right_value: Some(value),
            },
            "<=" => Self {
                left_value: None,
                left_op: BoundOp::LessEq,
                right_op: BoundOp::LessEq,
                right_value: Some(value),
            },
            ">" => Self::new(Some(value), BoundOp::Less, BoundOp::LessEq, None),
            ">=" => Self::new(Some(value), BoundOp::LessEq, BoundOp::LessEq, None),
            _ => panic!("unknown interval operator: {op}"),
        }
    }

    /// `lv lop key rop rv`, both bounds explicit (either `Value` may be `None`).
    #[must_use]
    pub fn new(
        left_value: Option<Value>,
        left_op: BoundOp,
        right_op: BoundOp,
        right_value: Option<Value>,
    ) -> Self {
        let collapse = matches!((&left_value, &right_value), (Some(a), Some(b)) if a == b)
            && left_op == BoundOp::LessEq
            && right_op == BoundOp::LessEq;
        if collapse {
            Self {
                left_value,
                left_op: BoundOp::Eq,
                right_op: BoundOp::Eq,
                right_value,
            }
        } else {
            Self {
                left_value,
                left_op,
                right_op,
                right_value,
            }
        }
    }

    #[must_use]
    pub const fn left_value(&self) -> Option<&Value> {
        self.left_value.as_ref()
    }

    #[must_use]
    pub const fn right_value(&self) -> Option<&Value> {
        self.right_value.as_ref()
    }

    #[must_use]
    pub const fn left_closed(&self) -> bool {
        self.left_op.is_closed()
    }

    #[must_use]
    pub const fn right_closed(&self) -> bool {
        self.right_op.is_closed()
    }

    /// `lv >= rv` with either bound strict makes the interval empty.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match (&self.left_value, &self.right_value) {
            (Some(lv), Some(rv)) => {
                let strict = self.left_op != BoundOp::Eq || self.right_op != BoundOp::Eq;
                !(strict && lv >= rv)
            }
            _ => true,
        }
    }

    fn after_left(&self, value: &Value) -> bool {
        match &self.left_value {
            None => true,
            Some(lv) => lv < value || (lv <= value && self.left_closed()),
        }
    }

    fn before_right(&self, value: &Value) -> bool {
        match &self.right_value {
            None => true,
            Some(rv) => rv > value || (rv >= value && self.right_closed()),
        }
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.after_left(value) && self.before_right(value)
    }

    /// Backward-compatible alias matching the source's `is_inside_or_equal`
    /// name for value containment (interval-vs-interval equality is just
    /// `==`, folded in here for parity with the original call sites).
    #[must_use]
    pub fn is_inside_or_equal(&self, value: &Value) -> bool {
        self.contains(value)
    }

    /// Is `other`'s left bound strictly inside `self`?
    #[must_use]
    pub fn left_inside(&self, other: &Self) -> bool {
        let Some(other_lv) = &other.left_value else {
            return false;
        };
        let after = match &self.left_value {
            None => true,
            Some(self_lv) => {
                self_lv < other_lv
                    || (self_lv == other_lv && !other.left_closed() && self.left_closed())
            }
        };
        let before = match &self.right_value {
            None => true,
            Some(self_rv) => {
                self_rv > other_lv || (self_rv == other_lv && self.right_closed() && other.left_closed())
            }
        };
        after && before
    }

    /// Is `other`'s right bound strictly inside `self`?
    #[must_use]
    pub fn right_inside(&self, other: &Self) -> bool {
        let Some(other_rv) = &other.right_value else {
            return false;
        };
        let before = match &self.right_value {
            None => true,
            Some(self_rv) => {
                self_rv > other_rv || (self_rv == other_rv && !other.right_closed() && self.right_closed())
            }
        };
        let after = match &self.left_value {
            None => true,
            Some(self_lv) => {
                self_lv < other_rv || (self_lv == other_rv && self.left_closed() && other.right_closed())
            }
        };
        before && after
    }

    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        other.right_inside(self) || other.left_inside(self)
    }

    /// Splits `self` around `other`'s bound when exactly one of `other`'s
    /// bounds lies strictly inside `self`. Returns 0 or 2 intervals;
    /// preserves `self`'s outer bounds and flips openness at the new seam.
    #[must_use]
    pub fn split_by(&self, other: &Self) -> Vec<Self> {
        if self == other {
            return Vec::new();
        }
        if self.left_inside(other) {
            let Some(bound) = other.left_value.clone() else {
                return Vec::new();
            };
            let new_right_op = if other.left_closed() {
                BoundOp::Less
            } else {
                BoundOp::LessEq
            };
            return alloc::vec![
                Self::new(self.left_value.clone(), self.left_op, new_right_op, Some(bound.clone())),
                Self::new(Some(bound), other.left_op, self.right_op, self.right_value.clone()),
            ];
        }
        if self.right_inside(other) {
            let Some(bound) = other.right_value.clone() else {
                return Vec::new();
            };
            let new_left_op = if other.right_closed() {
                BoundOp::Less
            } else {
                BoundOp::LessEq
            };
            return alloc::vec![
                Self::new(self.left_value.clone(), self.left_op, other.right_op, Some(bound.clone())),
                Self::new(Some(bound), new_left_op, self.right_op, self.right_value.clone()),
            ];
        }
        Vec::new()
    }

    #[must_use]
    pub fn render(&self, key: &Attribute) -> alloc::string::String {
        match (&self.left_value, &self.right_value) {
            (None, Some(rv)) => alloc::format!("{key}{}{rv}", op_str(self.right_op)),
            (Some(lv), None) => {
                let op = if self.left_op == BoundOp::Less { ">" } else { ">=" };
                alloc::format!("{key}{op}{lv}")
            }
            (Some(lv), Some(_)) if self.left_op == BoundOp::Eq && self.right_op == BoundOp::Eq => {
                alloc::format!("{key}={lv}")
            }
            (Some(lv), Some(rv)) => alloc::format!(
                "{lv}{}{key}{}{rv}",
                op_str(self.left_op),
                op_str(self.right_op)
            ),
            (None, None) => alloc::format!("{key}=*"),
        }
    }
}

fn op_str(op: BoundOp) -> &'static str {
    match op {
        BoundOp::Less => "<",
        BoundOp::LessEq => "<=",
        BoundOp::Eq => "=",
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?} {:?} {:?} {:?}]",
            self.left_value, self.left_op, self.right_op, self.right_value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: i64) -> Value {
        Value::Int(i)
    }

    #[test]
    fn equal_closed_bounds_collapse_to_eq() {
        let interval = Interval::new(Some(v(5)), BoundOp::LessEq, BoundOp::LessEq, Some(v(5)));
        assert_eq!(interval.left_op, BoundOp::Eq);
        assert_eq!(interval.right_op, BoundOp::Eq);
    }

    #[test]
    fn contains_respects_boundary_operator() {
        let le = Interval::one_sided("<=", v(10));
        assert!(le.contains(&v(10)));
        let lt = Interval::one_sided("<", v(10));
        assert!(!lt.contains(&v(10)));
    }

    #[test]
    fn split_by_returns_two_when_strictly_inside() {
        // self: 1 < a < 9 ; other: a = 5
        let outer = Interval::new(Some(v(1)), BoundOp::Less, BoundOp::Less, Some(v(9)));
        let other = Interval::one_sided("=", v(5));
        let parts = outer.split_by(&other);
        assert_eq!(parts.len(), 2);
        assert!(!parts[0].contains(&v(5)));
        assert!(parts[1].contains(&v(5)));
    }

    #[test]
    fn split_by_returns_none_when_not_strictly_inside() {
        let a = Interval::one_sided("<=", v(5));
        let b = Interval::one_sided(">", v(5));
        assert!(a.split_by(&b).is_empty());
    }

    #[test]
    fn is_disjoint_true_for_non_overlapping() {
        let a = Interval::one_sided("<=", v(5));
        let b = Interval::one_sided(">", v(5));
        assert!(a.is_disjoint(&b));
    }

    #[test]
    fn inconsistent_when_left_exceeds_right() {
        let bad = Interval::new(Some(v(5)), BoundOp::Less, BoundOp::Less, Some(v(1)));
        assert!(!bad.is_consistent());
    }
}
