//! Post-Processor (§4.5): turns a raw solver assignment into the statistics,
//! coverage-gap diagnostics, and relaxation ladder the output envelope needs.
//!
//! Nothing here talks to the solver directly — it only reads the `Model` and
//! the flat `(worker, shift, requirement)` triples `solver::solve` produced.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::instrument;

use crate::domain::{BudgetEnvelope, FairnessEnvelope};
use crate::error::{EngineError, EngineResult};
use crate::model::Model;
use crate::solver::Assignment;

/// Why a requirement slot went unfilled, in the fixed priority order §4.5.1
/// evaluates them: the first reason that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapReason {
    NoEligibleWorkers,
    AllEligibleAtCap,
    OverlapBlocked,
    BudgetExhaustedForDay,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct CoverageGap {
    pub shift_idx: usize,
    pub requirement_idx: usize,
    pub missing_count: u32,
    pub eligible_worker_count: usize,
    pub reason: GapReason,
}

#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub num_workers_used: usize,
    pub avg_hours_per_worker: f64,
    pub max_shift_imbalance: u32,
    pub total_hours: f64,
}

/// Per-worker totals accumulated once from the final assignment and reused by
/// both statistics and gap-reason inference.
struct WorkerTotals {
    minutes: Vec<u32>,
    shift_count: Vec<u32>,
    day_shifts: Vec<[Vec<usize>; 7]>,
}

fn accumulate(model: &Model, assignments: &[Assignment]) -> WorkerTotals {
    let n = model.workers().len();
    let mut totals = WorkerTotals {
        minutes: vec![0; n],
        shift_count: vec![0; n],
        day_shifts: vec![Default::default(); n],
    };
    for &(w, s, _r) in assignments {
        let shift = &model.shifts()[s];
        totals.minutes[w] += shift.window.duration_minutes();
        totals.shift_count[w] += 1;
        totals.day_shifts[w][shift.day.index()].push(s);
    }
    totals
}

#[instrument(skip_all, fields(assignments = assignments.len()))]
pub fn total_cost(model: &Model, assignments: &[Assignment]) -> Decimal {
    assignments
        .iter()
        .map(|&(w, s, _)| model.cost(w, s))
        .sum()
}

pub fn compute_statistics(model: &Model, assignments: &[Assignment]) -> Statistics {
    let totals = accumulate(model, assignments);
    let used: Vec<usize> = (0..model.workers().len())
        .filter(|&w| totals.shift_count[w] > 0)
        .collect();

    if used.is_empty() {
        return Statistics::default();
    }

    let total_minutes: u32 = used.iter().map(|&w| totals.minutes[w]).sum();
    let total_hours = total_minutes as f64 / 60.0;

    let counts: Vec<u32> = used.iter().map(|&w| totals.shift_count[w]).collect();
    let max_count = *counts.iter().max().unwrap();
    let min_count = *counts.iter().min().unwrap();

    Statistics {
        num_workers_used: used.len(),
        avg_hours_per_worker: total_hours / used.len() as f64,
        max_shift_imbalance: max_count - min_count,
        total_hours,
    }
}

/// Enumerates every unfilled requirement slot and assigns it a reason,
/// evaluated in the fixed priority order from §4.5.1: a shift with nobody
/// eligible at all is reported as such even if, say, the budget also ran out.
#[instrument(skip_all, fields(assignments = assignments.len()))]
pub fn compute_coverage_gaps(
    model: &Model,
    assignments: &[Assignment],
    budget: &BudgetEnvelope,
) -> Vec<CoverageGap> {
    let totals = accumulate(model, assignments);
    let mut filled_by_slot: HashMap<(usize, usize), u32> = HashMap::new();
    for &(_, s, r) in assignments {
        *filled_by_slot.entry((s, r)).or_insert(0) += 1;
    }

    let daily_cost = daily_cost_totals(model, assignments);

    let mut gaps = Vec::new();
    for (s_idx, shift) in model.shifts().iter().enumerate() {
        for (r_idx, req) in shift.requirements.iter().enumerate() {
            let filled = filled_by_slot.get(&(s_idx, r_idx)).copied().unwrap_or(0);
            if filled >= req.count {
                continue;
            }
            let missing = req.count - filled;
            let eligible = &model.eligible_for_requirement[s_idx][r_idx];
            let reason = infer_gap_reason(model, &totals, budget, &daily_cost, s_idx, eligible);
            gaps.push(CoverageGap {
                shift_idx: s_idx,
                requirement_idx: r_idx,
                missing_count: missing,
                eligible_worker_count: eligible.len(),
                reason,
            });
        }
    }
    gaps
}

fn daily_cost_totals(model: &Model, assignments: &[Assignment]) -> [Decimal; 7] {
    let mut totals = [Decimal::ZERO; 7];
    for &(w, s, _) in assignments {
        let day = model.shifts()[s].day;
        totals[day.index()] += model.cost(w, s);
    }
    totals
}

fn infer_gap_reason(
    model: &Model,
    totals: &WorkerTotals,
    budget: &BudgetEnvelope,
    daily_cost: &[Decimal; 7],
    shift_idx: usize,
    eligible: &[usize],
) -> GapReason {
    if eligible.is_empty() {
        return GapReason::NoEligibleWorkers;
    }

    let shift = &model.shifts()[shift_idx];
    let duration = shift.window.duration_minutes();

    let all_at_cap = eligible.iter().all(|&w| {
        let max_minutes = (model.workers()[w].max_hours * 60.0).round() as u32;
        totals.minutes[w] + duration > max_minutes
    });
    if all_at_cap {
        return GapReason::AllEligibleAtCap;
    }

    let all_overlap_blocked = eligible.iter().all(|&w| {
        totals.day_shifts[w][shift.day.index()]
            .iter()
            .any(|&other| other != shift_idx && model.shifts()[other].window.overlaps(shift.window))
    });
    if all_overlap_blocked {
        return GapReason::OverlapBlocked;
    }

    if let Some(max_daily) = budget.max_daily_cost {
        if daily_cost[shift.day.index()] >= max_daily {
            return GapReason::BudgetExhaustedForDay;
        }
    }

    GapReason::Unknown
}

/// One rung of the fixed relaxation ladder (§4.5: applied in order, one rung
/// at a time, stopping at the first rung that yields a feasible solve).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationStep {
    RelaxConsecutiveDays,
    RelaxRestHours,
    DropDailyBudget,
    AllowOverBudget,
    DropMinHours,
}

impl RelaxationStep {
    pub const LADDER: [RelaxationStep; 5] = [
        RelaxationStep::RelaxConsecutiveDays,
        RelaxationStep::RelaxRestHours,
        RelaxationStep::DropDailyBudget,
        RelaxationStep::AllowOverBudget,
        RelaxationStep::DropMinHours,
    ];

    pub fn description(self) -> &'static str {
        match self {
            RelaxationStep::RelaxConsecutiveDays => "relaxed max_consecutive_days by +1",
            RelaxationStep::RelaxRestHours => "relaxed min_rest_hours by -2 (floored at 8)",
            RelaxationStep::DropDailyBudget => "dropped the daily budget cap",
            RelaxationStep::AllowOverBudget => "allowed total cost up to 10% over budget",
            RelaxationStep::DropMinHours => "dropped the minimum-hours constraint",
        }
    }
}

/// Applies one rung of the ladder in place. `drop_min_hours` is tracked
/// separately from `FairnessEnvelope`/`BudgetEnvelope` because it gates
/// whether `solver::solve` builds O5 terms at all, not a numeric field.
pub fn apply_relaxation(
    step: RelaxationStep,
    fairness: &mut FairnessEnvelope,
    budget: &mut BudgetEnvelope,
    drop_min_hours: &mut bool,
) {
    match step {
        RelaxationStep::RelaxConsecutiveDays => {
            fairness.max_consecutive_days = (fairness.max_consecutive_days + 1).min(7);
        }
        RelaxationStep::RelaxRestHours => {
            fairness.min_rest_hours = (fairness.min_rest_hours - 2.0).max(8.0);
        }
        RelaxationStep::DropDailyBudget => {
            budget.max_daily_cost = None;
        }
        RelaxationStep::AllowOverBudget => {
            budget.max_total_cost *= Decimal::new(11, 1); // x1.1
        }
        RelaxationStep::DropMinHours => {
            *drop_min_hours = true;
        }
    }
}

/// §4.5 pre-flight: the cheapest possible way to staff every requirement,
/// ignoring every constraint except eligibility, one worker assigned to
/// arbitrarily many slots. If even this best case exceeds the budget, no
/// amount of solving or relaxing can succeed and the engine should short
/// circuit with `BudgetCoverageConflict` before ever building a `Solver`.
pub fn lower_bound_cost(model: &Model) -> Decimal {
    let mut total = Decimal::ZERO;
    for (s_idx, shift) in model.shifts().iter().enumerate() {
        for (r_idx, req) in shift.requirements.iter().enumerate() {
            let cheapest = model.eligible_for_requirement[s_idx][r_idx]
                .iter()
                .map(|&w| model.cost(w, s_idx))
                .min();
            if let Some(cost) = cheapest {
                total += cost * Decimal::from(req.count);
            }
        }
    }
    total
}

#[instrument(skip_all)]
pub fn preflight_budget_check(model: &Model, budget: &BudgetEnvelope) -> EngineResult<()> {
    let min_cost = lower_bound_cost(model);
    if min_cost > budget.max_total_cost {
        return Err(EngineError::BudgetCoverageConflict {
            min_cost,
            budget: budget.max_total_cost,
        });
    }
    Ok(())
}

/// Re-exported so callers building the output envelope's `total_cost` field
/// don't need to reach into `constraints` for the cents conversion directly.
pub fn cents_to_decimal(cents: i32) -> Decimal {
    Decimal::new(cents as i64, 2)
}
