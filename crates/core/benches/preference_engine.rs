use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hashbrown::HashSet;
use streampref_core::attribute::{Attribute, DataType};
use streampref_core::interval::Interval;
use streampref_core::operator::{Operator, PreferenceAlgorithm, PreferenceOp, RecordStream};
use streampref_core::record::Record;
use streampref_core::rule::{Condition, CpRule, Preference};
use streampref_core::theory::{Algorithm, CpTheory};
use streampref_core::value::Value;

fn price_attr() -> Attribute {
    Attribute::new("price", DataType::Integer)
}

fn rec(v: i64) -> Record {
    let mut r = Record::new();
    r.set(price_attr(), Value::Int(v));
    r
}

/// Prefers `price <= threshold/2` over `price >= threshold/2 + 1`.
fn cheap_preferred_theory(algorithm: Algorithm, threshold: i64) -> CpTheory {
    let half = threshold / 2;
    let condition = Condition::new(streampref_core::Formula::new());
    let preference = Preference::new(
        price_attr(),
        Interval::one_sided("<=", Value::Int(half)),
        Interval::one_sided(">=", Value::Int(half + 1)),
        HashSet::new(),
    );
    let rule = CpRule::new(condition, preference);
    CpTheory::new(vec![rule], algorithm, false).expect("rule is consistent")
}

fn build_records(n: usize) -> Vec<Record> {
    (0..n).map(|i| rec(i as i64)).collect()
}

fn bench_preference_op(c: &mut Criterion) {
    let mut group = c.benchmark_group("preference_op");

    for &size in &[10usize, 50, 200] {
        let records = build_records(size);

        group.bench_function(format!("depth_search_{size}"), |b| {
            b.iter(|| {
                let mut source = RecordStream::new(vec![price_attr()]);
                source.run(0, records.clone());
                let mut pref = PreferenceOp::new(source, cheap_preferred_theory(Algorithm::DepthSearch, size as i64), PreferenceAlgorithm::DepthSearch, -1);
                pref.run(0);
                black_box(pref.get_current_list().len())
            });
        });

        group.bench_function(format!("partition_{size}"), |b| {
            b.iter(|| {
                let mut source = RecordStream::new(vec![price_attr()]);
                source.run(0, records.clone());
                let mut pref = PreferenceOp::new(source, cheap_preferred_theory(Algorithm::Partition, size as i64), PreferenceAlgorithm::Partition, -1);
                pref.run(0);
                black_box(pref.get_current_list().len())
            });
        });

        group.bench_function(format!("inc_ancestors_{size}"), |b| {
            b.iter(|| {
                let mut source = RecordStream::new(vec![price_attr()]);
                source.run(0, records.clone());
                let mut pref = PreferenceOp::new(source, cheap_preferred_theory(Algorithm::Partition, size as i64), PreferenceAlgorithm::IncAncestors, -1);
                pref.run(0);
                black_box(pref.get_current_list().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_preference_op);
criterion_main!(benches);
