//! Records: maps from [`Attribute`] to [`Value`] with stable, sorted identity.

use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::attribute::Attribute;
use crate::value::Value;

/// An immutable mapping from attribute to value, with no duplicate keys.
///
/// Backed by a sorted `Vec` rather than a `HashMap` so that identity
/// (used as hierarchy/partition keys, matching the original's
/// `tuple(record.items())` idiom) is cheap and deterministic: equal
/// records always produce equal, order-independent identity tuples.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Record {
    entries: Vec<(Attribute, Value)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `attr` to `value`, replacing any existing entry, and keeps
    /// `entries` sorted by attribute so two records with the same content
    /// always compare equal regardless of insertion order.
    pub fn set(&mut self, attr: Attribute, value: Value) {
        match self.entries.binary_search_by(|(a, _)| a.cmp(&attr)) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (attr, value)),
        }
    }

    #[must_use]
    pub fn with(mut self, attr: Attribute, value: Value) -> Self {
        self.set(attr, value);
        self
    }

    #[must_use]
    pub fn get(&self, attr: &Attribute) -> Option<&Value> {
        self.entries
            .binary_search_by(|(a, _)| a.cmp(attr))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    #[must_use]
    pub fn contains(&self, attr: &Attribute) -> bool {
        self.get(attr).is_some()
    }

    pub fn remove(&mut self, attr: &Attribute) -> Option<Value> {
        self.entries
            .binary_search_by(|(a, _)| a.cmp(attr))
            .ok()
            .map(|idx| self.entries.remove(idx).1)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter().map(|(a, _)| a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Attribute, &Value)> {
        self.entries.iter().map(|(a, v)| (a, v))
    }

    /// Merges `other`'s entries into `self`, overwriting on conflict --
    /// mirrors `dict.update` in `get_record_list` (identifier attributes
    /// merged onto a position record).
    pub fn update(&mut self, other: &Self) {
        for (attr, value) in &other.entries {
            self.set(attr.clone(), value.clone());
        }
    }

    /// A new record keeping only the given attributes, in their order.
    #[must_use]
    pub fn project(&self, attrs: &[Attribute]) -> Self {
        let mut result = Self::new();
        for attr in attrs {
            if let Some(v) = self.get(attr) {
                result.set(attr.clone(), v.clone());
            }
        }
        result
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (attr, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{attr}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// Multiset difference `a \ b`: elements of `a` not matched one-for-one by
/// an equal element of `b`.
///
/// Grounded in `operators/bag.py`'s `bag_except`, used by the `Operator`
/// trait's default `inserted`/`deleted` computation (§4.9).
#[must_use]
pub fn bag_except(a: &[Record], b: &[Record]) -> Vec<Record> {
    let mut remaining: HashMap<&Record, usize> = HashMap::new();
    for r in b {
        *remaining.entry(r).or_insert(0) += 1;
    }
    let mut result = Vec::new();
    for r in a {
        let count = remaining.entry(r).or_insert(0);
        if *count > 0 {
            *count -= 1;
        } else {
            result.push(r.clone());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    #[test]
    fn set_keeps_sorted_identity() {
        let mut r1 = Record::new();
        r1.set(attr("b"), Value::Int(2));
        r1.set(attr("a"), Value::Int(1));

        let mut r2 = Record::new();
        r2.set(attr("a"), Value::Int(1));
        r2.set(attr("b"), Value::Int(2));

        assert_eq!(r1, r2);
    }

    #[test]
    fn bag_except_is_multiset_aware() {
        let mut r = Record::new();
        r.set(attr("a"), Value::Int(1));
        let a = alloc::vec![r.clone(), r.clone(), r.clone()];
        let b = alloc::vec![r.clone()];
        assert_eq!(bag_except(&a, &b).len(), 2);
    }
}
