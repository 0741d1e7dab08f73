use std::{fs, process};

use clap::Parser;
use streampref_cli::{App, Command, GenerateArgs, RunArgs};
use streampref_core::attribute::{Attribute, DataType};
use streampref_core::interval::Interval;
use streampref_core::operator::{Operator, PreferenceOp, RecordStream};
use streampref_core::rule::{Condition, CpRule, Preference};
use streampref_core::theory::{Algorithm, CpTheory};
use streampref_core::value::Value;
use streampref_core::Formula;
use streampref_testgen::generator::Run;

fn main() {
    tracing_subscriber::fmt::init();
    let app = App::parse();
    match &app.command {
        Command::Generate(args) => generate(args),
        Command::Run(args) => run(args),
    }
}

fn generate(args: &GenerateArgs) {
    fs::create_dir_all(&args.output_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output directory: {e}");
        process::exit(1);
    });

    let runs = streampref_testgen::generator::generate_mult_runs(
        args.n_run,
        args.n_attribute,
        args.n_tick,
        args.n_record_per_tick,
        args.value_range,
    );

    for run in &runs {
        let path = args.output_dir.join(format!("{}.json", run.get_id()));
        let file = fs::File::create(&path).unwrap_or_else(|e| {
            eprintln!("Failed to create {}: {e}", path.display());
            process::exit(1);
        });
        serde_json::to_writer_pretty(file, run).unwrap_or_else(|e| {
            eprintln!("Failed to write {}: {e}", path.display());
            process::exit(1);
        });
    }

    println!("Generated {} runs to {}", runs.len(), args.output_dir.display());
}

/// Builds the lone demo rule driving `streampref run`: records with a
/// smaller `preferred_attribute` dominate ones with a larger value,
/// regardless of every other attribute. There is no grammar front-end in
/// this crate, so the rule set is fixed rather than parsed from a file.
fn demo_theory(preferred_attribute: &str, n_attribute: u64, value_range: i64) -> CpTheory {
    let attribute = Attribute::new(preferred_attribute, DataType::Integer);
    let midpoint = value_range / 2;
    let indifferent = (0..n_attribute)
        .map(|i| Attribute::new(format!("a{i}"), DataType::Integer))
        .filter(|a| a != &attribute)
        .collect();

    let preference = Preference::new(
        attribute,
        Interval::one_sided("<", Value::Int(midpoint)),
        Interval::one_sided(">=", Value::Int(midpoint)),
        indifferent,
    );
    let rule = CpRule::new(Condition::new(Formula::new()), preference);
    CpTheory::new(vec![rule], Algorithm::Partition, false).unwrap_or_else(|e| {
        eprintln!("Demo rule failed consistency checking: {e:?}");
        process::exit(1);
    })
}

fn run(args: &RunArgs) {
    let mut entries: Vec<_> = fs::read_dir(&args.input_dir)
        .unwrap_or_else(|e| {
            eprintln!("Failed to read input directory: {e}");
            process::exit(1);
        })
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort_by_key(fs::DirEntry::path);

    if entries.is_empty() {
        eprintln!("No .json files found in {}", args.input_dir.display());
        process::exit(1);
    }

    for entry in entries {
        let path = entry.path();
        let filename = path.file_name().unwrap_or_default().to_string_lossy().into_owned();

        let file = fs::File::open(&path).unwrap_or_else(|e| {
            eprintln!("Failed to open {filename}: {e}");
            process::exit(1);
        });
        let run: Run = serde_json::from_reader(file).unwrap_or_else(|e| {
            eprintln!("Failed to parse {filename}: {e}");
            process::exit(1);
        });

        let params = run.get_params();
        let theory = demo_theory(&args.preferred_attribute, params.n_attribute, params.value_range);

        println!("== {filename} ==");
        for (tick, records) in run.get_data() {
            let attributes: Vec<Attribute> = (0..params.n_attribute).map(|i| Attribute::new(format!("a{i}"), DataType::Integer)).collect();
            let mut source = RecordStream::new(attributes);
            source.run(*tick, records.clone());
            let mut preference = PreferenceOp::new(source, theory.clone(), args.algorithm.into(), args.top);
            preference.run(*tick);
            for record in preference.get_current_list() {
                println!("{tick}\t{record}");
            }
        }
    }
}
