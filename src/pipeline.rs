//! Top-level orchestration (§2.4): validate → build model → seed → pre-flight
//! → solve, retrying down the relaxation ladder on infeasibility → post-process
//! into the file-out envelope. This is the one function `main` (and the test
//! suite) calls into.
//!
//! The solve step itself is two-phase (§4.5): every attempt up through the
//! last relaxation-ladder rung requires full coverage as a hard constraint,
//! so an over-constrained instance comes back genuinely `Unsatisfiable` and
//! actually drives the ladder. Only once the ladder is exhausted without a
//! feasible full-coverage solve does a final pass drop coverage back to the
//! soft O4 objective term, so the engine still reports the best partial
//! staffing it can find instead of a hard failure.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::domain::Instance;
use crate::dto::{
    AssignmentDto, CoverageGapDto, EngineInput, EngineOutcome, FailureEnvelope, FailureReasonDto,
    GapReasonDto, SolutionDto, SolveStatusDto, StatisticsDto, SuccessEnvelope,
};
use crate::error::EngineError;
use crate::model::Model;
use crate::postprocess::{self, CoverageGap, GapReason, RelaxationStep};
use crate::seed;
use crate::solver::{self, SolveOutcome, SolveStatus};
use crate::validate;

/// Runs the full pipeline on already-parsed input and produces the envelope
/// that gets serialized to the output file. Never panics on a malformed or
/// infeasible *problem* — those map to `EngineOutcome::Failure`; only an I/O
/// failure reading/writing the surrounding files propagates past the caller.
#[instrument(skip_all)]
pub fn run_pipeline(input: EngineInput) -> EngineOutcome {
    let started = Instant::now();

    let instance = match validate::validate_and_normalize(input) {
        Ok(instance) => instance,
        Err(err) => return error_envelope(&err, Vec::new()),
    };

    let warnings = instance.warnings.clone();
    let time_limit = Duration::from_secs(instance.config.time_limit_secs.max(1));
    let threads = instance.config.threads;

    let model = build_model(instance);

    if let Err(err) = postprocess::preflight_budget_check(&model, &model.instance.budget) {
        return error_envelope(&err, warnings);
    }

    let seed = seed::build_seed(&model);

    let mut fairness = model.instance.fairness;
    let mut budget = model.instance.budget;
    let mut drop_min_hours = false;
    let mut relaxations_applied: Vec<String> = Vec::new();

    let outcome = loop {
        let result = solver::solve(
            &model,
            &seed,
            &fairness,
            &budget,
            drop_min_hours,
            true, // full coverage required through the ladder
            remaining(time_limit, started),
            threads,
        );

        match result {
            SolveOutcome::Solved(result) => break Some(result),
            SolveOutcome::Infeasible => {
                let next_step = RelaxationStep::LADDER
                    .get(relaxations_applied.len())
                    .copied();
                match next_step {
                    Some(step) => {
                        warn!(step = ?step, "full coverage infeasible, applying next relaxation ladder rung");
                        postprocess::apply_relaxation(step, &mut fairness, &mut budget, &mut drop_min_hours);
                        relaxations_applied.push(step.description().to_string());
                    }
                    None => break None,
                }
            }
        }
    };

    let result = match outcome {
        Some(result) => result,
        None => {
            // Full coverage stays unsatisfiable through the entire ladder —
            // e.g. too few eligible workers for the demand, which no amount
            // of relaxing fairness/budget/min-hours fixes. Fall back to the
            // soft coverage objective so the engine reports the best partial
            // staffing it can find instead of a hard failure.
            warn!("full coverage unsatisfiable through the entire relaxation ladder, falling back to soft coverage");
            let fallback = solver::solve(
                &model,
                &seed,
                &fairness,
                &budget,
                drop_min_hours,
                false,
                remaining(time_limit, started),
                threads,
            );
            match fallback {
                SolveOutcome::Solved(result) => {
                    relaxations_applied
                        .push("fell back to soft coverage (no relaxation achieves full coverage)".to_string());
                    result
                }
                SolveOutcome::Infeasible => {
                    let gaps = postprocess::compute_coverage_gaps(&model, &[], &budget);
                    let err = EngineError::Infeasible {
                        last_failing_constraint: relaxations_applied
                            .last()
                            .cloned()
                            .unwrap_or_else(|| "initial solve".to_string()),
                    };
                    let mut envelope = error_envelope(&err, warnings);
                    if let EngineOutcome::Failure(ref mut f) = envelope {
                        f.coverage_gaps = gaps.into_iter().map(|g| coverage_gap_dto(&model, g)).collect();
                    }
                    return envelope;
                }
            }
        }
    };

    info!(
        status = ?result.status,
        assignments = result.assignments.len(),
        relaxations = relaxations_applied.len(),
        "solve complete"
    );

    success_envelope(&model, result, &budget, relaxations_applied, warnings, started)
}

fn build_model(instance: Instance) -> Model {
    Model::build(instance)
}

fn remaining(time_limit: Duration, started: Instant) -> Duration {
    time_limit.saturating_sub(started.elapsed()).max(Duration::from_millis(1))
}

fn success_envelope(
    model: &Model,
    result: solver::SolveResult,
    budget: &crate::domain::BudgetEnvelope,
    relaxations_applied: Vec<String>,
    warnings: Vec<String>,
    started: Instant,
) -> EngineOutcome {
    let assignments = build_assignment_dtos(model, &result.assignments);
    let total_cost = postprocess::total_cost(model, &result.assignments);
    let stats = postprocess::compute_statistics(model, &result.assignments);
    let gaps = postprocess::compute_coverage_gaps(model, &result.assignments, budget);

    let budget_utilization = if budget.max_total_cost.is_zero() {
        0.0
    } else {
        use rust_decimal::prelude::ToPrimitive;
        (total_cost / budget.max_total_cost).to_f64().unwrap_or(0.0)
    };

    let solution = SolutionDto {
        assignments,
        total_cost,
        budget_utilization,
        solve_time: started.elapsed().as_secs_f64(),
        status: match result.status {
            SolveStatus::Optimal => SolveStatusDto::Optimal,
            SolveStatus::Feasible => SolveStatusDto::Feasible,
        },
        relaxations_applied,
        statistics: StatisticsDto {
            num_workers_used: stats.num_workers_used,
            avg_hours_per_worker: stats.avg_hours_per_worker,
            max_shift_imbalance: stats.max_shift_imbalance,
            total_hours: stats.total_hours,
        },
    };

    EngineOutcome::Success(SuccessEnvelope {
        success: true,
        solution,
        coverage_gaps: gaps.into_iter().map(|g| coverage_gap_dto(model, g)).collect(),
        messages: warnings,
    })
}

fn build_assignment_dtos(model: &Model, assignments: &[(usize, usize, usize)]) -> Vec<AssignmentDto> {
    let mut out = Vec::with_capacity(assignments.len());
    for &(w_idx, s_idx, _r_idx) in assignments {
        let worker = &model.workers()[w_idx];
        let shift = &model.shifts()[s_idx];
        out.push(AssignmentDto {
            worker_id: worker.id.clone(),
            shift_id: shift.id.clone(),
            day: shift.day.to_string(),
            start_time: shift.window.start.to_string(),
            end_time: shift.window.end.to_string(),
            duration_hours: shift.duration_hours(),
            cost: model.cost(w_idx, s_idx),
        });
    }
    out
}

fn coverage_gap_dto(model: &Model, gap: CoverageGap) -> CoverageGapDto {
    let shift = &model.shifts()[gap.shift_idx];
    let req = &shift.requirements[gap.requirement_idx];
    CoverageGapDto {
        shift_id: shift.id.clone(),
        day: shift.day.to_string(),
        window: format!("{}-{}", shift.window.start, shift.window.end),
        missing_count: gap.missing_count,
        role: req.role.clone(),
        required_skill: req.required_skill.clone(),
        eligible_worker_count: gap.eligible_worker_count,
        reason: match gap.reason {
            GapReason::NoEligibleWorkers => GapReasonDto::NoEligibleWorkers,
            GapReason::AllEligibleAtCap => GapReasonDto::AllEligibleAtCap,
            GapReason::OverlapBlocked => GapReasonDto::OverlapBlocked,
            GapReason::BudgetExhaustedForDay => GapReasonDto::BudgetExhaustedForDay,
            GapReason::Unknown => GapReasonDto::Unknown,
        },
    }
}

/// Builds the `success: false` envelope for any `EngineError`, including
/// ones raised outside the pipeline proper (e.g. malformed input JSON the
/// CLI could not even deserialize into an [`EngineInput`]) — §7 policy: a
/// structured envelope is the reported outcome, not a process crash, for
/// every error kind except genuine I/O failure.
pub fn error_envelope(err: &EngineError, warnings: Vec<String>) -> EngineOutcome {
    let reason = match err {
        EngineError::BudgetCoverageConflict { .. } => FailureReasonDto::BudgetCoverageConflict,
        EngineError::Infeasible { .. } => FailureReasonDto::Infeasible,
        _ => FailureReasonDto::ValidationError,
    };

    let mut details = HashMap::new();
    details.insert("message".to_string(), serde_json::Value::String(err.to_string()));
    if let EngineError::BudgetCoverageConflict { min_cost, budget } = err {
        details.insert(
            "min_cost".to_string(),
            serde_json::to_value(min_cost).unwrap_or(serde_json::Value::Null),
        );
        details.insert(
            "budget".to_string(),
            serde_json::to_value(budget).unwrap_or(serde_json::Value::Null),
        );
    }

    EngineOutcome::Failure(FailureEnvelope {
        success: false,
        reason,
        details,
        coverage_gaps: Vec::new(),
        messages: warnings,
    })
}
