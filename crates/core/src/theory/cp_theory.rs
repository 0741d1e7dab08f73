//! Conditional preference theories: a consistent set of CP-rules plus a
//! dominance test.
//!
//! Ground truth: `preference/theory.py::CPTheory`.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::attribute::Attribute;
use crate::comparison::{compare_stability, Comparison};
use crate::error::TheoryError;
use crate::formula::Formula;
use crate::graph::DiGraph;
use crate::record::Record;
use crate::rule::{CpRule, SearchRecord};

/// Selects which dominance algorithm [`CpTheory::dominates`] runs.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Recursive depth-first search over rule applications (§4.4).
    DepthSearch,
    /// Pre-synthesized essential comparisons, checked directly (no
    /// transitive closure beyond what synthesis already folded in).
    Partition,
}

/// A consistent set of CP-rules.
#[derive(Debug, Clone)]
pub struct CpTheory {
    rules: Vec<CpRule>,
    algorithm: Algorithm,
    comparisons: Vec<Comparison>,
}

impl CpTheory {
    /// Build a theory, checking consistency (rule-level invariants, the
    /// split-to-disjoint-intervals fixpoint, then global and local
    /// acyclicity) unless `skip_consistency` is set -- used when the
    /// caller (depth search, SeqTree rule extraction) already knows the
    /// rule set is consistent by construction.
    ///
    /// # Errors
    /// Returns the first consistency failure found.
    pub fn new(rules: Vec<CpRule>, algorithm: Algorithm, skip_consistency: bool) -> Result<Self, TheoryError> {
        let rules = if skip_consistency {
            rules
        } else {
            for rule in &rules {
                rule.is_consistent().map_err(|_| TheoryError::LocalCycle)?;
            }
            let split = split_rules(rules);
            if !is_globally_consistent(&split) {
                return Err(TheoryError::GlobalCycle);
            }
            if !is_locally_consistent(&split) {
                return Err(TheoryError::LocalCycle);
            }
            split
        };
        let comparisons = if algorithm == Algorithm::Partition {
            build_comparisons(&rules)
        } else {
            Vec::new()
        };
        Ok(Self { rules, algorithm, comparisons })
    }

    #[must_use]
    pub fn rules(&self) -> &[CpRule] {
        &self.rules
    }

    #[must_use]
    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `record1` dominates `record2`, dispatched on the configured
    /// algorithm.
    #[must_use]
    pub fn dominates(&self, record1: &Record, record2: &Record) -> bool {
        if record1 == record2 {
            return false;
        }
        match self.algorithm {
            Algorithm::DepthSearch => {
                dominates_by_search(&self.rules, &SearchRecord::from_record(record1.clone()), record2)
            }
            Algorithm::Partition => self.comparisons.iter().any(|c| c.dominates(record1, record2)),
        }
    }
}

/// `record` satisfies `goal`'s attributes, treating absent goal
/// attributes (dropped indifferent ones) as wildcards.
///
/// A goal attribute left behind by a rule demotion only needs `record`'s
/// value to fall inside its worst interval; every other goal attribute
/// needs an exact match.
///
/// Ground truth: `preference/theory.py::is_goal_record`, including its
/// `isinstance(goal_value, Interval)` containment branch.
#[must_use]
pub fn is_goal_record(record: &Record, goal: &SearchRecord) -> bool {
    goal.record().iter().all(|(attr, goal_value)| record.get(attr) == Some(goal_value))
        && goal.demotions().all(|(attr, worst)| record.get(attr).is_some_and(|v| worst.is_inside_or_equal(v)))
}

fn dominates_by_search(rules: &[CpRule], record1: &SearchRecord, record2: &Record) -> bool {
    if is_goal_record(record2, record1) {
        return true;
    }
    for (idx, rule) in rules.iter().enumerate() {
        if let Some(new_record) = rule.change_record(record1) {
            let remaining: Vec<CpRule> =
                rules.iter().enumerate().filter(|(i, _)| *i != idx).map(|(_, r)| r.clone()).collect();
            if dominates_by_search(&remaining, &new_record, record2) {
                return true;
            }
        }
    }
    false
}

/// Repeatedly splits rules against each other's condition/preference
/// intervals until no split applies.
///
/// Ground truth: `preference/theory.py::_split_rules`.
fn split_rules(mut rules: Vec<CpRule>) -> Vec<CpRule> {
    loop {
        let mut splits = None;
        'search: for i in 0..rules.len() {
            for j in 0..rules.len() {
                if i == j {
                    continue;
                }
                let pieces = rules[i].split(&rules[j]);
                if !pieces.is_empty() {
                    splits = Some((i, pieces));
                    break 'search;
                }
            }
        }
        let Some((idx, pieces)) = splits else {
            return rules;
        };
        rules.remove(idx);
        for piece in pieces {
            rules.push(piece);
        }
    }
}

/// Global consistency: the `condition attrs -> preference attr ->
/// indifferent attrs` digraph over every rule must be acyclic (§4.4).
fn is_globally_consistent(rules: &[CpRule]) -> bool {
    let mut graph: DiGraph<Attribute> = DiGraph::default();
    for rule in rules {
        let pref_attr = rule.preference().attribute();
        for attr in rule.condition().attributes() {
            graph.add_edge(attr.clone(), pref_attr.clone());
        }
        for attr in rule.preference().indifferent_set() {
            graph.add_edge(pref_attr.clone(), attr.clone());
        }
    }
    graph.is_acyclic()
}

/// Local consistency: for every maximal set of pairwise-compatible rules
/// (same preference attribute, agreeing present-condition values), the
/// `best-interval -> worst-interval` digraph must be acyclic.
fn is_locally_consistent(rules: &[CpRule]) -> bool {
    for rule_set in compatible_sets(rules) {
        let mut graph: DiGraph<String> = DiGraph::default();
        for &idx in &rule_set {
            let rule = &rules[idx];
            graph.add_edge(rule.preference().best().render(rule.preference().attribute()), rule.preference().worst().render(rule.preference().attribute()));
        }
        if !graph.is_acyclic() {
            return false;
        }
    }
    true
}

fn is_present_compatible(a: &CpRule, b: &CpRule) -> bool {
    for (attr, interval) in a.condition().formula().iter() {
        if let Some(other) = b.condition().formula().get(attr) {
            if other != interval {
                return false;
            }
        }
    }
    true
}

fn is_compatible(a: &CpRule, b: &CpRule) -> bool {
    a.preference().attribute() == b.preference().attribute() && is_present_compatible(a, b)
}

/// Maximal sets of pairwise-compatible rule indices.
///
/// Ground truth: `CPTheory._get_compatible_sets`.
fn compatible_sets(rules: &[CpRule]) -> Vec<Vec<usize>> {
    let mut sets: Vec<HashSet<usize>> = (0..rules.len()).map(|i| [i].into_iter().collect()).collect();
    loop {
        let mut changed = false;
        let mut next: Vec<HashSet<usize>> = Vec::new();
        for set in &sets {
            let mut combined = false;
            for idx in 0..rules.len() {
                if set.contains(&idx) {
                    continue;
                }
                if set.iter().all(|&other| is_compatible(&rules[idx], &rules[other])) {
                    combined = true;
                    let mut new_set = set.clone();
                    new_set.insert(idx);
                    if !next.contains(&new_set) {
                        changed = true;
                        next.push(new_set);
                    }
                }
            }
            if !combined {
                next.push(set.clone());
            }
        }
        sets = next;
        if !changed {
            break;
        }
    }
    sets.into_iter().map(|s| s.into_iter().collect()).collect()
}

/// The full universe of conjunctive formulas obtainable by combining one
/// atomic proposition per attribute mentioned in any rule's condition or
/// preference.
///
/// Ground truth: `CPTheory._build_formulas`.
fn build_formula_universe(rules: &[CpRule]) -> Vec<Formula> {
    let mut atomics: Vec<Formula> = Vec::new();
    for rule in rules {
        for (attr, interval) in rule.condition().formula().iter() {
            let f = Formula::new().with(attr.clone(), interval.clone());
            if !atomics.contains(&f) {
                atomics.push(f);
            }
        }
        for (attr, interval) in [
            (rule.preference().attribute(), rule.preference().best()),
            (rule.preference().attribute(), rule.preference().worst()),
        ] {
            let f = Formula::new().with(attr.clone(), interval.clone());
            if !atomics.contains(&f) {
                atomics.push(f);
            }
        }
    }
    let mut formulas = atomics.clone();
    for atomic in &atomics {
        let Some((att, _)) = atomic.iter().next() else { continue };
        let mut additions = Vec::new();
        for formula in &formulas {
            if formula.contains_attr(att) {
                continue;
            }
            let combined = formula.union(atomic);
            if !formulas.contains(&combined) && !additions.contains(&combined) {
                additions.push(combined);
            }
        }
        formulas.extend(additions);
    }
    formulas
}

/// Synthesizes the essential comparisons of a theory: direct comparisons
/// from each rule's `formula_dominates`, their transitive closure
/// (Floyd-Warshall over the formula-index matrix), then pruned to the
/// essential (most generic) subset.
///
/// Ground truth: `CPTheory._build_comparisons` /
/// `_build_transitive_comparisons` / `_clean_comparisons`.
fn build_comparisons(rules: &[CpRule]) -> Vec<Comparison> {
    let formulas = build_formula_universe(rules);
    let n = formulas.len();
    let mut cells: Vec<Vec<Vec<Comparison>>> = (0..n).map(|_| (0..n).map(|_| Vec::new()).collect()).collect();
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            for rule in rules {
                if rule.formula_dominates(&formulas[i], &formulas[j]) {
                    let comp = Comparison::new(
                        formulas[i].clone(),
                        formulas[j].clone(),
                        rule.preference().indifferent_set().clone(),
                    );
                    if !cells[i][j].contains(&comp) {
                        cells[i][j].push(comp);
                    }
                }
            }
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if cells[i][k].is_empty() || cells[k][j].is_empty() {
                    continue;
                }
                let combined: Vec<Comparison> = cells[i][k]
                    .iter()
                    .flat_map(|c1| {
                        cells[k][j].iter().map(move |c2| {
                            let indiff: HashSet<Attribute> =
                                c1.indifferent_set().iter().cloned().chain(c2.indifferent_set().iter().cloned()).collect();
                            Comparison::new(c1.best().clone(), c2.worst().clone(), indiff)
                        })
                    })
                    .collect();
                for comp in combined {
                    if !cells[i][j].contains(&comp) {
                        cells[i][j].push(comp);
                    }
                }
            }
        }
    }
    let mut all: Vec<Comparison> = Vec::new();
    for row in cells {
        for cell in row {
            all.extend(cell);
        }
    }
    clean_comparisons(all)
}

/// Drops every comparison that another, more generic comparison already
/// subsumes.
///
/// Ground truth: `CPTheory._clean_comparisons`.
fn clean_comparisons(mut all: Vec<Comparison>) -> Vec<Comparison> {
    all.sort_by(compare_stability);
    let mut essential: Vec<Comparison> = Vec::new();
    while let Some(comp) = all.pop() {
        let subsumed = all.iter().chain(essential.iter()).any(|other| other.is_more_generic_than(&comp));
        if !subsumed {
            essential.push(comp);
        }
    }
    essential
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;
    use crate::interval::Interval;
    use crate::rule::{Condition, Preference};
    use crate::value::Value;

    fn attr(name: &str) -> Attribute {
        Attribute::new(name, DataType::Integer)
    }

    fn simple_rule(pref_attr: &str, best: i64, worst: i64) -> CpRule {
        CpRule::new(
            Condition::new(Formula::new()),
            Preference::new(
                attr(pref_attr),
                Interval::one_sided("=", Value::Int(best)),
                Interval::one_sided("=", Value::Int(worst)),
                HashSet::new(),
            ),
        )
    }

    #[test]
    fn depth_search_dominates_direct_rule_application() {
        let theory = CpTheory::new(alloc::vec![simple_rule("a", 1, 0)], Algorithm::DepthSearch, false).unwrap();
        let mut r1 = Record::new();
        r1.set(attr("a"), Value::Int(1));
        let mut r2 = Record::new();
        r2.set(attr("a"), Value::Int(0));
        assert!(theory.dominates(&r1, &r2));
        assert!(!theory.dominates(&r2, &r1));
    }

    #[test]
    fn conflicting_preference_intervals_are_locally_inconsistent() {
        let rules = alloc::vec![simple_rule("a", 1, 0), simple_rule("a", 0, 1)];
        assert!(CpTheory::new(rules, Algorithm::DepthSearch, false).is_err());
    }
}
