//! Constraint Solver (§4.4): builds the CP-SAT model over `pumpkin-solver`
//! from a `Model` plus a (possibly relaxed) fairness/budget envelope and
//! runs a time-limited search for the weighted multi-objective optimum.
//! `pumpkin-solver` exposes no warm-start/hint entry point beyond
//! `default_brancher()` (see `utf8proj-solver`'s `optimal.rs`), so the
//! First-Fit-Decreasing seed is not handed to the search as a hint; it is
//! only consulted when the solver times out with no incumbent of its own
//! (the `OptimisationResult::Unknown` arm below).
//!
//! `require_full_coverage` controls whether every requirement slot must be
//! filled exactly (used for the initial attempt and every relaxation-ladder
//! rung, so an over-constrained instance reports genuinely `Unsatisfiable`
//! and the ladder in `pipeline::run_pipeline` actually fires) or coverage is
//! left as the soft O4 objective term (the final fallback pass once the
//! ladder is exhausted, producing the best partial staffing instead of a
//! hard failure).

use std::time::Duration;

use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::results::{OptimisationResult, ProblemSolution};
use pumpkin_solver::termination::TimeBudget;
use pumpkin_solver::variables::TransformableVariable;
use pumpkin_solver::Solver;
use tracing::{instrument, warn};

use crate::constraints::{self, DecisionVars};
use crate::domain::{BudgetEnvelope, FairnessEnvelope};
use crate::model::Model;
use crate::seed::Seed;

/// One unit of uncovered headcount, shift-count imbalance, or under-min-hour
/// deficit is priced at this many cents before the spec's weights (§4.4
/// O3–O5) are applied, so the objective's money-shaped terms (O1/O2, already
/// in cents) never accidentally outweigh the count-shaped ones. $100/unit is
/// comfortably above a single shift's typical marginal cost delta.
const COUNT_UNIT_CENTS: i32 = 10_000;
/// Clears the 0.5 weight on O2 (budget-target deviation) so every
/// coefficient below is an integer; see §4.4.1.
const OBJECTIVE_SCALE: i32 = 2;

const COST_COEF: i32 = OBJECTIVE_SCALE; // O1 weight 1.0
const TARGET_DEV_COEF: i32 = 1; // OBJECTIVE_SCALE * 0.5
const FAIRNESS_COEF: i32 = OBJECTIVE_SCALE * 2 * COUNT_UNIT_CENTS; // O3 weight 2.0
const COVERAGE_COEF: i32 = OBJECTIVE_SCALE * 10 * COUNT_UNIT_CENTS; // O4 weight 10.0, dominant
const UNDER_MIN_COEF_PER_MINUTE: i32 = OBJECTIVE_SCALE * COUNT_UNIT_CENTS / 60; // O5 weight 1.0, per minute

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
}

/// `(worker_idx, shift_idx, requirement_idx)` triples decoded from `x=1`.
pub type Assignment = (usize, usize, usize);

#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub assignments: Vec<Assignment>,
}

pub enum SolveOutcome {
    Solved(SolveResult),
    Infeasible,
}

/// Runs one CP-SAT solve under the given (possibly relaxed) envelopes.
/// `drop_min_hours` implements relaxation ladder step 5 (§4.5): when set,
/// O5 and its underlying constraint bookkeeping are omitted entirely.
#[instrument(skip_all, fields(workers = model.workers().len(), shifts = model.shifts().len()))]
pub fn solve(
    model: &Model,
    seed: &Seed,
    fairness: &FairnessEnvelope,
    budget: &BudgetEnvelope,
    drop_min_hours: bool,
    require_full_coverage: bool,
    time_limit: Duration,
    threads: u32,
) -> SolveOutcome {
    if threads > 1 {
        warn!(
            threads,
            "pumpkin-solver's embedded search is single-threaded; \
             continuing on one thread to preserve P7 determinism"
        );
    }

    let mut solver = Solver::default();
    let vars = constraints::build_decision_vars(&mut solver, model);

    constraints::post_requirement_caps(&mut solver, model, &vars);
    if require_full_coverage {
        constraints::post_full_coverage(&mut solver, model, &vars);
    }
    constraints::post_no_overlap(&mut solver, model, &vars);
    constraints::post_max_hours(&mut solver, model, &vars);
    constraints::post_rest(&mut solver, model, &vars, fairness.min_rest_hours);
    constraints::post_consecutive_days(&mut solver, model, &vars, fairness.max_consecutive_days);

    let total_cost_upper = total_cost_upper_bound_cents(model);
    let total_cost_cap = constraints::decimal_to_cents(budget.max_total_cost).min(total_cost_upper);
    constraints::post_budget(&mut solver, model, &vars, budget, total_cost_cap);

    let objective = build_objective(&mut solver, model, &vars, budget, drop_min_hours, total_cost_upper);

    let mut brancher = solver.default_brancher();
    let mut termination = TimeBudget::starting_now(time_limit);

    fn noop_callback<B>(_: &Solver, _: pumpkin_solver::results::SolutionReference, _: &B) {}
    let result = solver.optimise(
        &mut brancher,
        &mut termination,
        LinearSatUnsat::new(OptimisationDirection::Minimise, objective, noop_callback),
    );

    match result {
        OptimisationResult::Optimal(solution) => SolveOutcome::Solved(SolveResult {
            status: SolveStatus::Optimal,
            assignments: decode(&vars, |v| solution.get_integer_value(v) as i64),
        }),
        OptimisationResult::Satisfiable(solution) => SolveOutcome::Solved(SolveResult {
            status: SolveStatus::Feasible,
            assignments: decode(&vars, |v| solution.get_integer_value(v) as i64),
        }),
        OptimisationResult::Unsatisfiable => SolveOutcome::Infeasible,
        OptimisationResult::Unknown => {
            // No incumbent before the deadline. Fall back to the FFD seed
            // (§4.3) and report it as a FEASIBLE result rather than failing
            // outright.
            if seed.assigned.is_empty() {
                SolveOutcome::Infeasible
            } else {
                warn!("solver exhausted its time budget with no incumbent; falling back to the FFD seed");
                SolveOutcome::Solved(SolveResult {
                    status: SolveStatus::Feasible,
                    assignments: seed.assigned.clone(),
                })
            }
        }
    }
}

fn decode(
    vars: &DecisionVars,
    get: impl Fn(pumpkin_solver::variables::DomainId) -> i64,
) -> Vec<Assignment> {
    let mut out = Vec::new();
    for (s_idx, per_requirement) in vars.by_requirement.iter().enumerate() {
        for (r_idx, slot) in per_requirement.iter().enumerate() {
            for &(w_idx, var) in slot {
                if get(var) == 1 {
                    out.push((w_idx, s_idx, r_idx));
                }
            }
        }
    }
    out.sort_unstable();
    out
}

/// A loose but valid upper bound on total cost: the sum, over every eligible
/// pair, of its cost. Since each `(w,s)` contributes at most once, actual
/// total cost can never exceed this.
fn total_cost_upper_bound_cents(model: &Model) -> i32 {
    let mut total: i64 = 0;
    for w_idx in 0..model.workers().len() {
        for s_idx in 0..model.shifts().len() {
            if model.is_eligible(w_idx, s_idx) {
                total += constraints::cost_cents(model, w_idx, s_idx) as i64;
            }
        }
    }
    total.min(i32::MAX as i64) as i32
}

/// Builds the weighted objective variable (§4.4 O1–O5) and returns it.
fn build_objective(
    solver: &mut Solver,
    model: &Model,
    vars: &DecisionVars,
    budget: &BudgetEnvelope,
    drop_min_hours: bool,
    total_cost_upper: i32,
) -> pumpkin_solver::variables::DomainId {
    use pumpkin_solver::constraints as cp;

    let tag = solver.new_constraint_tag();

    // total_cost_var = Σ cost[w,s] * x[w,s] (cents)
    let total_cost_var = solver.new_bounded_integer(0, total_cost_upper);
    let mut cost_terms = Vec::new();
    for w_idx in 0..model.workers().len() {
        for (&s_idx, slot_vars) in &vars.by_worker_shift[w_idx] {
            let cents = constraints::cost_cents(model, w_idx, s_idx);
            cost_terms.extend(slot_vars.iter().map(|v| v.scaled(cents)));
        }
    }
    cost_terms.push(total_cost_var.scaled(-1));
    solver.add_constraint(cp::equals(cost_terms, 0, tag)).post();

    // O4: uncovered[s] = headcount(s) - Σ x[w,s] for every shift that has
    // requirements; empty-eligibility shifts contribute their full
    // headcount unconditionally since they never get decision variables.
    let mut uncovered_vars = Vec::new();
    for (s_idx, shift) in model.shifts().iter().enumerate() {
        let headcount = shift.headcount();
        if headcount == 0 {
            continue;
        }
        if model.empty_eligibility_shifts.contains(&s_idx) {
            let fixed = solver.new_bounded_integer(headcount as i32, headcount as i32);
            uncovered_vars.push(fixed);
            continue;
        }
        let uncovered = solver.new_bounded_integer(0, headcount as i32);
        let mut terms: Vec<_> = (0..model.workers().len())
            .flat_map(|w_idx| vars.terms_for(w_idx, s_idx).iter().map(|v| v.scaled(1)))
            .collect();
        terms.push(uncovered.scaled(1));
        solver.add_constraint(cp::equals(terms, headcount as i32, tag)).post();
        uncovered_vars.push(uncovered);
    }

    // O3: shift_min <= shift_count[w] <= shift_max.
    let n_shifts = model.shifts().len() as i32;
    let shift_max = solver.new_bounded_integer(0, n_shifts);
    let shift_min = solver.new_bounded_integer(0, n_shifts);
    for w_idx in 0..model.workers().len() {
        let terms: Vec<_> = vars.by_worker_shift[w_idx]
            .values()
            .flatten()
            .map(|v| v.scaled(1))
            .collect();
        if terms.is_empty() {
            continue;
        }
        let mut upper = terms.clone();
        upper.push(shift_max.scaled(-1));
        solver.add_constraint(cp::less_than_or_equals(upper, 0, tag)).post();

        let mut lower: Vec<_> = terms.iter().map(|t| t.scaled(-1)).collect();
        lower.push(shift_min.scaled(1));
        solver.add_constraint(cp::less_than_or_equals(lower, 0, tag)).post();
    }

    // O2: target-cost deviation, linearized with two non-negative slacks.
    let (over, under) = match budget.target_cost {
        Some(target) => {
            let target_cents = constraints::decimal_to_cents(target);
            let over = solver.new_bounded_integer(0, total_cost_upper);
            let under = solver.new_bounded_integer(0, total_cost_upper);
            let terms = vec![total_cost_var.scaled(1), over.scaled(-1), under.scaled(1)];
            solver.add_constraint(cp::equals(terms, target_cents, tag)).post();
            (Some(over), Some(under))
        }
        None => (None, None),
    };

    // O5: under-min-hours penalty, in minutes.
    let mut under_min_vars = Vec::new();
    if !drop_min_hours {
        for (w_idx, worker) in model.workers().iter().enumerate() {
            let min_minutes = (worker.min_hours * 60.0).round() as i32;
            if min_minutes == 0 {
                continue;
            }
            let under_min = solver.new_bounded_integer(0, min_minutes);
            let mut terms = Vec::new();
            for (&s_idx, slot_vars) in &vars.by_worker_shift[w_idx] {
                let duration = model.shifts()[s_idx].window.duration_minutes() as i32;
                terms.extend(slot_vars.iter().map(|v| v.scaled(duration)));
            }
            terms.push(under_min.scaled(1));
            solver.add_constraint(cp::greater_than_or_equals(terms, min_minutes, tag)).post();
            under_min_vars.push(under_min);
        }
    }

    let mut obj_terms = vec![
        total_cost_var.scaled(COST_COEF),
        shift_max.scaled(FAIRNESS_COEF),
        shift_min.scaled(-FAIRNESS_COEF),
    ];
    for u in &uncovered_vars {
        obj_terms.push(u.scaled(COVERAGE_COEF));
    }
    for v in &under_min_vars {
        obj_terms.push(v.scaled(UNDER_MIN_COEF_PER_MINUTE));
    }
    if let (Some(over), Some(under)) = (over, under) {
        obj_terms.push(over.scaled(TARGET_DEV_COEF));
        obj_terms.push(under.scaled(TARGET_DEV_COEF));
    }

    // Generous static upper bound: worst case has every term at its own
    // domain ceiling simultaneously, which never happens in practice but
    // keeps the objective variable's domain provably wide enough.
    let obj_upper = (total_cost_upper as i64 * COST_COEF as i64
        + n_shifts as i64 * FAIRNESS_COEF as i64
        + uncovered_vars.len() as i64 * model.shifts().len() as i64 * COVERAGE_COEF as i64
        + under_min_vars.len() as i64 * 1440 * UNDER_MIN_COEF_PER_MINUTE as i64
        + 2 * total_cost_upper as i64 * TARGET_DEV_COEF as i64)
        .min(i32::MAX as i64) as i32;

    let objective = solver.new_bounded_integer(0, obj_upper);
    let mut link = obj_terms;
    link.push(objective.scaled(-1));
    solver.add_constraint(cp::equals(link, 0, tag)).post();

    objective
}
