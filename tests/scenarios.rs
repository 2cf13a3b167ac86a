//! Integration tests for the six boundary scenarios (§8).

use pretty_assertions::assert_eq;
use workforce_engine::demo_data::Scenario;
use workforce_engine::dto::{EngineOutcome, FailureReasonDto, GapReasonDto, SolveStatusDto};
use workforce_engine::pipeline::run_pipeline;

#[test]
fn happy_path_covers_every_shift_within_budget() {
    let input = Scenario::HappyPath.build();
    let n_shifts = input.shifts.len();
    let outcome = run_pipeline(input);

    match outcome {
        EngineOutcome::Success(success) => {
            assert!(success.success);
            assert!(success.solution.total_cost <= rust_decimal::Decimal::from(8000));
            assert!(success.solution.statistics.max_shift_imbalance <= 4);

            let covered_shifts: std::collections::HashSet<_> =
                success.solution.assignments.iter().map(|a| a.shift_id.clone()).collect();
            // Every shift in the happy-path fixture needs at least one
            // assignment for it to be considered covered; multiple
            // requirement slots on the same shift collapse to one id here.
            assert!(covered_shifts.len() <= n_shifts);
            assert!(success.coverage_gaps.is_empty(), "expected full coverage, got gaps: {:?}", success.coverage_gaps);
        }
        EngineOutcome::Failure(failure) => panic!("expected success, got failure: {:?}", failure.reason),
    }
}

#[test]
fn budget_conflict_short_circuits_before_solving() {
    let input = Scenario::BudgetConflict.build();
    let outcome = run_pipeline(input);

    match outcome {
        EngineOutcome::Failure(failure) => {
            assert!(!failure.success);
            assert!(matches!(failure.reason, FailureReasonDto::BudgetCoverageConflict));
            let min_cost = failure
                .details
                .get("min_cost")
                .and_then(|v| v.as_f64())
                .expect("min_cost present in details");
            assert!(min_cost > 500.0);
        }
        EngineOutcome::Success(_) => panic!("expected a budget/coverage conflict"),
    }
}

#[test]
fn single_worker_cannot_cover_a_hundred_shifts() {
    let input = Scenario::InfeasibleSingleWorker.build();
    let outcome = run_pipeline(input);

    match outcome {
        EngineOutcome::Success(success) => {
            assert!(success.success);
            assert!(!success.solution.assignments.is_empty());
            assert!(!success.coverage_gaps.is_empty());
            assert!(success
                .coverage_gaps
                .iter()
                .any(|g| matches!(g.reason, GapReasonDto::AllEligibleAtCap)));
        }
        EngineOutcome::Failure(failure) => panic!("expected a partial success, got: {:?}", failure.reason),
    }
}

#[test]
fn relaxation_ladder_drops_the_daily_budget_cap() {
    let input = Scenario::RelaxationLadder.build();
    let max_total_cost = input.budget.max_total_cost;
    let outcome = run_pipeline(input);

    match outcome {
        EngineOutcome::Success(success) => {
            assert!(success.success);
            assert!(!success.solution.relaxations_applied.is_empty());
            assert!(success
                .solution
                .relaxations_applied
                .iter()
                .any(|r| r.contains("daily budget")));
            assert!(success.solution.total_cost <= rust_decimal::Decimal::try_from(max_total_cost).unwrap());
        }
        EngineOutcome::Failure(failure) => panic!("expected the ladder to find a feasible solve: {:?}", failure.reason),
    }
}

#[test]
fn skill_scarcity_isolates_the_one_unfillable_shift() {
    let input = Scenario::SkillScarcity.build();
    let outcome = run_pipeline(input);

    match outcome {
        EngineOutcome::Success(success) => {
            assert!(success.success);
            let sommelier_gap = success
                .coverage_gaps
                .iter()
                .find(|g| g.shift_id == "wine-tasting")
                .expect("the sommelier shift should appear in coverage gaps");
            assert!(matches!(sommelier_gap.reason, GapReasonDto::NoEligibleWorkers));

            let other_gaps: Vec<_> =
                success.coverage_gaps.iter().filter(|g| g.shift_id != "wine-tasting").collect();
            assert!(other_gaps.is_empty(), "other shifts should solve normally: {other_gaps:?}");
        }
        EngineOutcome::Failure(failure) => panic!("expected success, got: {:?}", failure.reason),
    }
}

#[test]
fn determinism_same_seed_same_output() {
    let first = run_pipeline(Scenario::Determinism.build());
    let second = run_pipeline(Scenario::Determinism.build());

    let (EngineOutcome::Success(a), EngineOutcome::Success(b)) = (first, second) else {
        panic!("determinism scenario should solve successfully both times");
    };

    assert_eq!(format!("{:?}", a.solution.status), format!("{:?}", b.solution.status), "status mismatch");
    assert_eq!(a.solution.total_cost, b.solution.total_cost);
    assert_eq!(a.solution.relaxations_applied, b.solution.relaxations_applied);

    let ids_a: Vec<_> = a
        .solution
        .assignments
        .iter()
        .map(|x| (x.worker_id.clone(), x.shift_id.clone()))
        .collect();
    let ids_b: Vec<_> = b
        .solution
        .assignments
        .iter()
        .map(|x| (x.worker_id.clone(), x.shift_id.clone()))
        .collect();
    assert_eq!(ids_a, ids_b, "assignments must be byte-identical across runs with the same seed");
}

#[test]
fn status_dto_serializes_uppercase() {
    assert_eq!(
        serde_json::to_string(&SolveStatusDto::Optimal).unwrap(),
        "\"OPTIMAL\""
    );
}
