//! Crate-level scenarios exercising the engine end to end through its
//! public API: a single rule's direct dominance, genericity pruning
//! between two comparisons, the split-to-disjoint-intervals fixpoint,
//! incremental top-k equivalence between two hierarchies, and temporal
//! `FIRST` dominance. CONSEQ's incremental-vs-naive equivalence is
//! already covered by `operator::conseq`'s own unit tests.

use hashbrown::HashSet;

use streampref_core::attribute::{Attribute, DataType};
use streampref_core::comparison::Comparison;
use streampref_core::formula::Formula;
use streampref_core::hierarchy::{Hierarchy, HierarchyGraph, HierarchyPartition};
use streampref_core::interval::{BoundOp, Interval};
use streampref_core::record::Record;
use streampref_core::rule::{Condition, CpRule, Preference, TcpCondition, TcpRule};
use streampref_core::theory::{Algorithm, CpTheory, TcpTheory};
use streampref_core::value::Value;
use streampref_core::Sequence;

fn attr(name: &str) -> Attribute {
    Attribute::new(name, DataType::Integer)
}

fn rec(entries: &[(&str, i64)]) -> Record {
    let mut r = Record::new();
    for (name, v) in entries {
        r.set(attr(name), Value::Int(*v));
    }
    r
}

/// (a) `IF a=1 THEN b=2 BETTER b=3 (c)`: a record with `b=2` dominates
/// one with `b=3` whenever both satisfy `a=1`, regardless of `c`, under
/// either dominance algorithm.
#[test]
fn single_rule_dominance_holds_under_both_algorithms() {
    let condition = Condition::new(Formula::new().with(attr("a"), Interval::one_sided("=", Value::Int(1))));
    let preference = Preference::new(
        attr("b"),
        Interval::one_sided("=", Value::Int(2)),
        Interval::one_sided("=", Value::Int(3)),
        [attr("c")].into_iter().collect(),
    );
    let rule = CpRule::new(condition, preference);

    let better = rec(&[("a", 1), ("b", 2), ("c", 5)]);
    let worse = rec(&[("a", 1), ("b", 3), ("c", 9)]);

    for algorithm in [Algorithm::DepthSearch, Algorithm::Partition] {
        let theory = CpTheory::new(vec![rule.clone()], algorithm, false).expect("single rule is consistent");
        assert!(theory.dominates(&better, &worse), "{algorithm:?} should find better dominates worse");
        assert!(!theory.dominates(&worse, &better), "{algorithm:?} dominance must not be symmetric");
    }
}

/// (b) Genericity pruning: a comparison derived without any extra
/// attribute is more generic than one that pins an extra attribute to
/// the same value on both sides, so the essential set keeps only the
/// former.
#[test]
fn generic_comparison_subsumes_attribute_pinned_one() {
    let generic = Comparison::new(
        Formula::new().with(attr("x"), Interval::one_sided("=", Value::Int(1))),
        Formula::new().with(attr("x"), Interval::one_sided("=", Value::Int(2))),
        HashSet::new(),
    );
    let pinned = Comparison::new(
        Formula::new()
            .with(attr("x"), Interval::one_sided("=", Value::Int(1)))
            .with(attr("y"), Interval::one_sided("=", Value::Int(7))),
        Formula::new()
            .with(attr("x"), Interval::one_sided("=", Value::Int(2)))
            .with(attr("y"), Interval::one_sided("=", Value::Int(7))),
        HashSet::new(),
    );

    assert!(generic.is_more_generic_than(&pinned));
    assert!(!pinned.is_more_generic_than(&generic));
}

/// (c) Two unconditional preference rules with overlapping intervals on
/// the same attribute must be split into disjoint pieces by the
/// consistency fixpoint rather than rejected outright.
#[test]
fn overlapping_preference_intervals_are_split_into_a_consistent_theory() {
    let r1 = CpRule::new(
        Condition::new(Formula::new()),
        Preference::new(
            attr("a"),
            Interval::new(Some(Value::Int(1)), BoundOp::Less, BoundOp::Less, Some(Value::Int(9))),
            Interval::one_sided("=", Value::Int(10)),
            HashSet::new(),
        ),
    );
    let r2 = CpRule::new(
        Condition::new(Formula::new()),
        Preference::new(
            attr("a"),
            Interval::new(Some(Value::Int(2)), BoundOp::Less, BoundOp::Less, Some(Value::Int(5))),
            Interval::one_sided("=", Value::Int(11)),
            HashSet::new(),
        ),
    );

    let theory = CpTheory::new(vec![r1, r2], Algorithm::Partition, false);
    assert!(theory.is_ok(), "overlapping intervals should split rather than fail consistency: {theory:?}");
    assert!(theory.unwrap().rules().len() > 2, "splitting should have produced extra rule pieces");
}

/// (e) `HierarchyPartition` and `HierarchyGraph` must agree on top-k size
/// at every insertion step of an incrementally growing record set.
#[test]
fn incremental_hierarchies_agree_on_topk_size_at_every_step() {
    let condition = Condition::new(Formula::new());
    let preference = Preference::new(
        attr("price"),
        Interval::one_sided("<=", Value::Int(10)),
        Interval::one_sided(">=", Value::Int(11)),
        HashSet::new(),
    );
    let rule = CpRule::new(condition, preference);
    let theory = CpTheory::new(vec![rule], Algorithm::Partition, false).expect("rule is consistent");

    let mut graph = HierarchyGraph::new(theory.clone(), &[]);
    let mut partition = HierarchyPartition::new(theory.comparisons().to_vec(), &[]);

    for i in 0..20i64 {
        let record = rec(&[("price", i)]);
        graph.update(&[], &[record.clone()]);
        partition.update(&[], &[record]);

        let graph_topk = graph.topk(3);
        let partition_topk = partition.topk(3);
        assert!(graph_topk.len() <= 3);
        assert_eq!(graph_topk.len(), partition_topk.len(), "top-3 size mismatch after inserting record {i}");
    }
}

/// `DepthSearch` must dominate on a ranged worst interval exactly like
/// `Partition` does: the same `price<=10 BETTER price>=11` rule used by
/// [`incremental_hierarchies_agree_on_topk_size_at_every_step`] demoted
/// `price=5` to the scalar `11` instead of the whole `price>=11`
/// interval, so a record with `price=100` was missed as a goal.
#[test]
fn depth_search_dominates_with_ranged_worst_interval() {
    let condition = Condition::new(Formula::new());
    let preference = Preference::new(
        attr("price"),
        Interval::one_sided("<=", Value::Int(10)),
        Interval::one_sided(">=", Value::Int(11)),
        HashSet::new(),
    );
    let rule = CpRule::new(condition, preference);
    let theory = CpTheory::new(vec![rule], Algorithm::DepthSearch, false).expect("rule is consistent");

    let better = rec(&[("price", 5)]);
    let worse = rec(&[("price", 100)]);

    assert!(theory.dominates(&better, &worse), "price=5 should dominate price=100 under depth search");
    assert!(!theory.dominates(&worse, &better));
}

/// (f) `TCPRule IF FIRST THEN x=1 BETTER x=2 ()`: a sequence whose first
/// position satisfies the best interval dominates one whose first
/// position satisfies the worst interval, and the dominance does not
/// hold in reverse.
#[test]
fn temporal_first_dominance_is_directional() {
    let rule = TcpRule::new(
        TcpCondition::new(true, Vec::new()),
        Preference::new(attr("x"), Interval::one_sided("=", Value::Int(1)), Interval::one_sided("=", Value::Int(2)), HashSet::new()),
    );
    let theory = TcpTheory::new(vec![rule]).expect("FIRST rule is consistent");

    let mut s1 = Sequence::new();
    s1.append_position(rec(&[("x", 1)]), 0, -1, -1);
    s1.append_position(rec(&[("x", 2)]), 1, -1, -1);

    let mut s2 = Sequence::new();
    s2.append_position(rec(&[("x", 2)]), 0, -1, -1);
    s2.append_position(rec(&[("x", 1)]), 1, -1, -1);

    assert!(theory.dominates_by_search(&s1, &s2));
    assert!(!theory.dominates_by_search(&s2, &s1));
}

/// Universal invariant (§8): dominance under a non-trivial theory is
/// irreflexive.
#[test]
fn dominance_is_irreflexive() {
    let condition = Condition::new(Formula::new());
    let preference = Preference::new(attr("a"), Interval::one_sided("=", Value::Int(1)), Interval::one_sided("=", Value::Int(0)), HashSet::new());
    let rule = CpRule::new(condition, preference);
    let theory = CpTheory::new(vec![rule], Algorithm::Partition, false).expect("rule is consistent");

    let r = rec(&[("a", 1)]);
    assert!(!theory.dominates(&r, &r));
}

/// Universal invariant (§8): an [`Interval`] splits cleanly into
/// pairwise-disjoint pieces whose combined containment matches the
/// original span exactly, for every value in its domain.
#[test]
fn interval_split_round_trips_through_containment() {
    let whole = Interval::new(Some(Value::Int(0)), BoundOp::LessEq, BoundOp::Less, Some(Value::Int(10)));
    let cut = Interval::one_sided("=", Value::Int(5));
    let pieces = whole.split_by(&cut);
    assert!(!pieces.is_empty());

    for i in -2..12 {
        let value = Value::Int(i);
        let whole_contains = whole.contains(&value);
        let covered = pieces.iter().filter(|p| p.contains(&value)).count();
        assert_eq!(covered > 0, whole_contains, "value {i} containment mismatch");
        assert!(covered <= 1, "value {i} covered by more than one split piece");
    }
}
