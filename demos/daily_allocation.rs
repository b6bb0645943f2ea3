//! Simulate two weeks of a three-arm experiment, recomputing the split each day.
//!
//! Run with `RUST_LOG=mabsplit=debug` to see posterior samples and constraint
//! decisions. Config comes from the environment (`MIN_EXPLORE_RATE`,
//! `CONTROL_FLOOR`, ...), falling back to defaults.

use mabsplit::{aggregate_observations, Allocation, AllocationConfig, AllocationEngine, VariantObservation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = match AllocationConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("bad configuration: {e}");
            std::process::exit(2);
        }
    };
    let mut engine = match AllocationEngine::new(cfg) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    // Simulated true click-through rates.
    let arms = [("control", 0.040), ("variant_a", 0.055), ("variant_b", 0.035)];
    let daily_traffic = 400u64;

    // Separate RNG to simulate the environment.
    let mut env = StdRng::seed_from_u64(123);
    let mut rows: Vec<VariantObservation> = Vec::new();
    let mut previous: Option<Allocation> = None;

    for day in 1..=14u32 {
        let split = previous
            .clone()
            .unwrap_or_else(|| Allocation::uniform(arms.iter().map(|(n, _)| *n), 4));

        for (name, p) in arms {
            let impressions = (daily_traffic as f64 * split.get(name).unwrap_or(0.0)).round() as u64;
            let clicks = (0..impressions).filter(|_| env.random::<f64>() < p).count() as u64;
            rows.push(VariantObservation::new(name, impressions, clicks));
        }

        let window = aggregate_observations(&rows);
        let report = match engine.compute(&window, previous.as_ref()) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("day {day}: {e}");
                std::process::exit(1);
            }
        };

        eprintln!(
            "day={:2} mode={:10} impressions={:5} alloc={:?}",
            day,
            report.mode.as_str(),
            report.total_impressions,
            report.allocation.as_map()
        );
        if day == 14 {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("could not serialize report: {e}"),
            }
        }
        previous = Some(report.allocation);
    }
}
