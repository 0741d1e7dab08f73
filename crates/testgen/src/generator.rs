use chrono::{DateTime, Duration, Local};
use rand::distr::{Distribution, Uniform};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use streampref_core::attribute::{Attribute, DataType};
use streampref_core::record::Record;
use streampref_core::value::Value;
use typed_builder::TypedBuilder;

#[derive(Clone, Debug, Default, Deserialize, Serialize, TypedBuilder)]
pub struct RunParams {
    pub id: u64,
    pub n_attribute: u64,
    pub n_tick: u64,
    pub n_record_per_tick: u64,
    pub value_range: i64,
}

/// A generated run: a tick-indexed stream of record batches over a schema
/// of `n_attribute` integer attributes, plus wall-clock bookkeeping for
/// how long generation took.
#[derive(Deserialize, Serialize, Debug)]
pub struct Run {
    params: RunParams,
    info: String,
    start: DateTime<Local>,
    end: DateTime<Local>,
    data: Vec<(i64, Vec<Record>)>,
}

impl Run {
    #[must_use]
    pub const fn new(
        params: RunParams,
        info: String,
        start: DateTime<Local>,
        end: DateTime<Local>,
        data: Vec<(i64, Vec<Record>)>,
    ) -> Self {
        Self {
            params,
            info,
            start,
            end,
            data,
        }
    }

    #[must_use]
    pub const fn get_id(&self) -> u64 {
        self.params.id
    }

    #[must_use]
    pub const fn get_data(&self) -> &Vec<(i64, Vec<Record>)> {
        &self.data
    }

    #[must_use]
    pub const fn get_params(&self) -> &RunParams {
        &self.params
    }

    #[must_use]
    pub fn get_cloned_params(&self) -> RunParams {
        self.params.clone()
    }

    #[must_use]
    pub fn get_duration(&self) -> Duration {
        self.end - self.start
    }
}

fn schema_attributes(n_attribute: u64) -> Vec<Attribute> {
    (0..n_attribute).map(|i| Attribute::new(format!("a{i}"), DataType::Integer)).collect()
}

/// Generate a single run: `n_tick` timestamped batches of
/// `n_record_per_tick` records each, over `n_attribute` integer
/// attributes sampled uniformly from `[0, value_range)`.
///
/// # Panics
///
/// Panics if `value_range` is zero (cannot create a uniform distribution
/// over an empty range).
#[must_use]
pub fn generate_single_run(
    n_attribute: u64,
    n_tick: u64,
    n_record_per_tick: u64,
    value_range: i64,
) -> Vec<(i64, Vec<Record>)> {
    let attributes = schema_attributes(n_attribute);
    let mut random_generator = rand::rng();
    let value_distribution = Uniform::new(0, value_range).unwrap();

    (0..n_tick)
        .map(|tick| {
            let records = (0..n_record_per_tick)
                .map(|_| {
                    let mut record = Record::new();
                    for attribute in &attributes {
                        let value = value_distribution.sample(&mut random_generator);
                        record.set(attribute.clone(), Value::Int(value));
                    }
                    record
                })
                .collect();
            (tick as i64, records)
        })
        .collect::<Vec<_>>()
}

#[must_use]
pub fn generate_mult_runs(
    n_run: u64,
    n_attribute: u64,
    n_tick: u64,
    n_record_per_tick: u64,
    value_range: i64,
) -> Vec<Run> {
    (0..n_run)
        .into_par_iter()
        .map(|i_run| {
            let start_time = Local::now();
            let data = generate_single_run(n_attribute, n_tick, n_record_per_tick, value_range);
            let end_time = Local::now();
            Run {
                params: RunParams { id: i_run, n_attribute, n_tick, n_record_per_tick, value_range },
                info: "generated".to_string(),
                start: start_time,
                end: end_time,
                data,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_tick_and_batch_counts() {
        let data = generate_single_run(3, 5, 4, 100);
        assert_eq!(data.len(), 5);
        for (tick, records) in &data {
            assert_eq!(records.len(), 4);
            for record in records {
                assert_eq!(record.attributes().count(), 3);
            }
        }
        assert_eq!(data[0].0, 0);
        assert_eq!(data[4].0, 4);
    }

    #[test]
    fn parallel_runs_carry_distinct_ids() {
        let runs = generate_mult_runs(3, 2, 2, 2, 10);
        assert_eq!(runs.len(), 3);
        let mut ids: Vec<u64> = runs.iter().map(Run::get_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
