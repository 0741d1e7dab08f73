//! The preference half of a CP-rule: `(attribute, best, worst, indifferent)`.

use hashbrown::HashSet;

use crate::attribute::Attribute;
use crate::interval::Interval;

/// `(A, I+, I-, W)`: records with `A in I+` are preferred to records with
/// `A in I-`, all else equal outside `W`.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Preference {
    attribute: Attribute,
    best: Interval,
    worst: Interval,
    indifferent: HashSet<Attribute>,
}

impl Preference {
    #[must_use]
    pub fn new(
        attribute: Attribute,
        best: Interval,
        worst: Interval,
        indifferent: HashSet<Attribute>,
    ) -> Self {
        Self {
            attribute,
            best,
            worst,
            indifferent,
        }
    }

    #[must_use]
    pub const fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    #[must_use]
    pub const fn best(&self) -> &Interval {
        &self.best
    }

    #[must_use]
    pub const fn worst(&self) -> &Interval {
        &self.worst
    }

    #[must_use]
    pub const fn indifferent_set(&self) -> &HashSet<Attribute> {
        &self.indifferent
    }
}
