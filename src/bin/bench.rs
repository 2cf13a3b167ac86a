//! Pipeline-stage throughput benchmark.
//!
//! Run with: cargo run --release --bin bench

use std::time::Instant;

use workforce_engine::demo_data::DemoSize;
use workforce_engine::{model, seed, solver, validate};

fn main() {
    let input = DemoSize::Large.build();
    let n_workers = input.workers.len();
    let n_shifts = input.shifts.len();

    println!("Benchmark: pipeline stage throughput");
    println!("  Workers: {n_workers}");
    println!("  Shifts:  {n_shifts}");
    println!();

    let validate_start = Instant::now();
    let instance = validate::validate_and_normalize(input).expect("bench fixture is always valid");
    println!("  validate:   {:?}", validate_start.elapsed());

    let model_start = Instant::now();
    let model = model::Model::build(instance);
    println!("  build model:{:?}", model_start.elapsed());

    let seed_start = Instant::now();
    let seed = seed::build_seed(&model);
    println!("  seed:       {:?} ({} assignments)", seed_start.elapsed(), seed.assigned.len());

    let fairness = model.instance.fairness;
    let budget = model.instance.budget;

    let solve_start = Instant::now();
    // Measures one soft-coverage solve in isolation; the real pipeline's
    // hard-coverage-first-then-relax sequence lives in `pipeline::run_pipeline`.
    let outcome = solver::solve(
        &model,
        &seed,
        &fairness,
        &budget,
        false,
        false,
        std::time::Duration::from_secs(model.instance.config.time_limit_secs.max(1)),
        model.instance.config.threads,
    );
    let solve_elapsed = solve_start.elapsed();

    match outcome {
        solver::SolveOutcome::Solved(result) => {
            println!(
                "  solve:      {:?} (status={:?}, assignments={})",
                solve_elapsed,
                result.status,
                result.assignments.len()
            );
        }
        solver::SolveOutcome::Infeasible => {
            println!("  solve:      {solve_elapsed:?} (infeasible)");
        }
    }
}
