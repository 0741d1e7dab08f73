//! Temporal conditional preference rules: a [`TcpCondition`] paired with a
//! [`Preference`], evaluated against sequence positions rather than bare
//! records.
//!
//! Ground truth: `preference/rule.py::TCPRule`.

use hashbrown::HashSet;

use crate::attribute::Attribute;
use crate::error::RuleError;
use crate::interval::Interval;
use crate::rule::condition::{TcpCondition, Temporal, TemporalProposition};
use crate::rule::cp::CpRule;
use crate::rule::condition::Condition;
use crate::rule::preference::Preference;
use crate::sequence::Sequence;

/// A single TCP-rule.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct TcpRule {
    condition: TcpCondition,
    preference: Preference,
}

impl TcpRule {
    #[must_use]
    pub fn new(condition: TcpCondition, preference: Preference) -> Self {
        Self { condition, preference }
    }

    #[must_use]
    pub const fn condition(&self) -> &TcpCondition {
        &self.condition
    }

    #[must_use]
    pub const fn preference(&self) -> &Preference {
        &self.preference
    }

    /// Same invariants as [`CpRule::is_consistent`], checked against the
    /// union of present and past-tense proposition attributes.
    ///
    /// # Errors
    /// Returns the first invariant violated, as a [`RuleError`].
    pub fn is_consistent(&self) -> Result<(), RuleError> {
        let pref_attr = self.preference.attribute();
        let mut cond_attrs: HashSet<&Attribute> = HashSet::new();
        cond_attrs.extend(self.condition.attributes());
        if cond_attrs.contains(pref_attr) {
            return Err(RuleError::PreferenceAttributeInCondition { attribute: pref_attr.clone() });
        }
        if self.preference.indifferent_set().contains(pref_attr) {
            return Err(RuleError::PreferenceAttributeInIndifferentSet {
                attribute: pref_attr.clone(),
            });
        }
        for attr in self.preference.indifferent_set() {
            if cond_attrs.contains(attr) {
                return Err(RuleError::IndifferentSetOverlapsCondition { attribute: attr.clone() });
            }
        }
        Ok(())
    }

    /// Is the condition's `FIRST`/`PREVIOUS`/`SOME PREVIOUS`/`ALL PREVIOUS`
    /// structure compatible with `other`'s -- i.e. would a maximal
    /// temporal-compatible-set containing both ever be asked to agree on
    /// disjoint past intervals for the same attribute?
    ///
    /// Ground truth: `TCPCondition.is_temporal_compatible_to`, simplified:
    /// two rules are temporally compatible unless one's `FIRST` collides
    /// with the other's past predicates.
    #[must_use]
    pub fn is_temporal_compatible_to(&self, other: &Self) -> bool {
        let self_has_past = self.condition.propositions().iter().any(|p| p.qualifier != Temporal::Present);
        let other_has_past = other.condition.propositions().iter().any(|p| p.qualifier != Temporal::Present);
        !((self.condition.is_first() && other_has_past) || (other.condition.is_first() && self_has_past))
    }

    /// A non-temporal [`CpRule`] built from this rule's present-tense
    /// propositions only, for use inside a [`crate::theory::CpTheory`]
    /// evaluated against a single sequence position.
    ///
    /// Ground truth: `TCPRule.get_cprule`.
    #[must_use]
    pub fn to_cp_rule(&self) -> CpRule {
        let mut formula = crate::formula::Formula::new();
        for prop in self.condition.propositions() {
            if prop.qualifier == Temporal::Present {
                formula.set(prop.attribute.clone(), prop.interval.clone());
            }
        }
        CpRule::new(Condition::new(formula), self.preference.clone())
    }

    /// Intervals this rule constrains `attribute` with, across present
    /// and every past qualifier plus the preference bounds.
    #[must_use]
    pub fn intervals_for(&self, attribute: &Attribute) -> alloc::vec::Vec<Interval> {
        let mut out: alloc::vec::Vec<Interval> = self
            .condition
            .propositions()
            .iter()
            .filter(|p| &p.attribute == attribute)
            .map(|p| p.interval.clone())
            .collect();
        if self.preference.attribute() == attribute {
            out.push(self.preference.best().clone());
            out.push(self.preference.worst().clone());
        }
        out
    }

    /// Split this rule's condition or preference on `attribute`/`interval`,
    /// mirroring [`CpRule::split_by_interval`] but replaying the split
    /// across every temporal qualifier that mentions the attribute.
    #[must_use]
    pub fn split_by_interval(&self, attribute: &Attribute, interval: &Interval) -> alloc::vec::Vec<Self> {
        for (idx, prop) in self.condition.propositions().iter().enumerate() {
            if &prop.attribute != attribute {
                continue;
            }
            let pieces = prop.interval.split_by(interval);
            if pieces.is_empty() {
                continue;
            }
            return pieces
                .into_iter()
                .map(|piece| {
                    let mut new_props = self.condition.propositions().to_vec();
                    new_props[idx] = TemporalProposition {
                        qualifier: prop.qualifier,
                        attribute: attribute.clone(),
                        interval: piece,
                    };
                    let cond = TcpCondition::new(self.condition.is_first(), new_props);
                    Self::new(cond, self.preference.clone())
                })
                .collect();
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

    #[must_use]
    pub fn split(&self, other: &Self) -> alloc::vec::Vec<Self> {
        let mut seen: HashSet<Attribute> = HashSet::new();
        let mut attrs: alloc::vec::Vec<Attribute> =
            other.condition.propositions().iter().map(|p| p.attribute.clone()).collect();
        attrs.push(other.preference.attribute().clone());
        for attr in attrs {
            if !seen.insert(attr.clone()) {
                continue;
            }
            for interval in other.intervals_for(&attr) {
                let pieces = self.split_by_interval(&attr, &interval);
                if !pieces.is_empty() {
                    return pieces;
                }
            }
        }
        alloc::vec::Vec::new()
    }

    /// Is this rule's condition satisfied by `seq[pos]`, counting the
    /// present-record check?
    #[must_use]
    pub fn is_valid_by_position(&self, seq: &Sequence, pos: usize) -> bool {
        self.condition.is_valid_by_position(seq, pos)
    }

    /// Past-only variant, skipping the present-record check (§4.8, SeqTree
    /// rule extraction).
    #[must_use]
    pub fn is_temporal_valid_by_position(&self, seq: &Sequence, pos: usize) -> bool {
        self.condition.is_temporal_valid_by_position(seq, pos)
    }
}
