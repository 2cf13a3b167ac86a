//! Hard constraint posting for the CP-SAT model (§4.4 H1–H8).
//!
//! Each `post_*` function takes the live `pumpkin_solver::Solver` and the
//! `DecisionVars` built by [`crate::solver::build_decision_vars`] and posts
//! one family of hard constraints. Nothing here reads back a solution —
//! extraction lives in `solver`.

use std::collections::HashMap;

use pumpkin_solver::constraints as cp;
use pumpkin_solver::variables::{DomainId, TransformableVariable};
use pumpkin_solver::Solver;

use crate::domain::{BudgetEnvelope, Day};
use crate::model::Model;

/// `y[w,s,r]` decision variables, indexed two ways: by `(shift, requirement)`
/// for the per-requirement cap (H1/H2), and by `(worker, shift)` for every
/// other hard constraint and the objective, which only ever care whether a
/// worker is assigned to a shift, not which requirement slot they fill.
pub struct DecisionVars {
    pub by_requirement: Vec<Vec<Vec<(usize, DomainId)>>>,
    pub by_worker_shift: Vec<HashMap<usize, Vec<DomainId>>>,
}

impl DecisionVars {
    pub fn terms_for(&self, worker: usize, shift: usize) -> &[DomainId] {
        self.by_worker_shift[worker]
            .get(&shift)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn build_decision_vars(solver: &mut Solver, model: &Model) -> DecisionVars {
    let n_workers = model.workers().len();
    let mut by_requirement = Vec::with_capacity(model.shifts().len());
    let mut by_worker_shift: Vec<HashMap<usize, Vec<DomainId>>> = vec![HashMap::new(); n_workers];

    for (s_idx, shift) in model.shifts().iter().enumerate() {
        let mut reqs = Vec::with_capacity(shift.requirements.len());
        for r_idx in 0..shift.requirements.len() {
            let mut slot = Vec::new();
            for &w_idx in &model.eligible_for_requirement[s_idx][r_idx] {
                let var = solver.new_bounded_integer(0, 1);
                slot.push((w_idx, var));
                by_worker_shift[w_idx].entry(s_idx).or_default().push(var);
            }
            reqs.push(slot);
        }
        by_requirement.push(reqs);
    }

    DecisionVars { by_requirement, by_worker_shift }
}

/// H1/H2: no more than `count(r)` of the assigned workers fill requirement
/// `r`, and a worker who matches more than one requirement of the same
/// shift fills at most one of them.
pub fn post_requirement_caps(solver: &mut Solver, model: &Model, vars: &DecisionVars) {
    let tag = solver.new_constraint_tag();
    for (s_idx, shift) in model.shifts().iter().enumerate() {
        for (r_idx, req) in shift.requirements.iter().enumerate() {
            let terms: Vec<_> = vars.by_requirement[s_idx][r_idx]
                .iter()
                .map(|&(_, v)| v.scaled(1))
                .collect();
            if !terms.is_empty() {
                solver
                    .add_constraint(cp::less_than_or_equals(terms, req.count as i32, tag))
                    .post();
            }
        }
    }

    for per_shift in &vars.by_worker_shift {
        for shift_vars in per_shift.values() {
            if shift_vars.len() > 1 {
                let terms: Vec<_> = shift_vars.iter().map(|v| v.scaled(1)).collect();
                solver.add_constraint(cp::less_than_or_equals(terms, 1, tag)).post();
            }
        }
    }
}

/// Hard full-coverage pass: every requirement slot that has at least one
/// eligible worker must be filled exactly (`Σ_w x[w,s,r] == count(r)`), not
/// just capped from above. Posted only on a solve attempt that requires full
/// coverage (§4.5: the first attempt and every relaxation-ladder rung), so
/// that an over-constrained instance comes back genuinely `Unsatisfiable`
/// instead of the optimizer quietly shipping it as a cheaper uncovered slot.
/// Slots with no eligible worker at all are skipped — they have no decision
/// variables to equate to anything, and are reported as coverage gaps, not
/// as the reason the whole solve failed.
pub fn post_full_coverage(solver: &mut Solver, model: &Model, vars: &DecisionVars) {
    let tag = solver.new_constraint_tag();
    for (s_idx, shift) in model.shifts().iter().enumerate() {
        for (r_idx, req) in shift.requirements.iter().enumerate() {
            if model.eligible_for_requirement[s_idx][r_idx].is_empty() {
                continue;
            }
            let terms: Vec<_> = vars.by_requirement[s_idx][r_idx]
                .iter()
                .map(|&(_, v)| v.scaled(1))
                .collect();
            solver.add_constraint(cp::equals(terms, req.count as i32, tag)).post();
        }
    }
}

/// H3: a worker's assigned shifts on a given day form an antichain under the
/// overlap relation O (§3).
pub fn post_no_overlap(solver: &mut Solver, model: &Model, vars: &DecisionVars) {
    let tag = solver.new_constraint_tag();
    for w_idx in 0..model.workers().len() {
        for day in Day::ALL {
            let shifts_on_day = &model.worker_day_shifts[w_idx][day.index()];
            for i in 0..shifts_on_day.len() {
                for j in (i + 1)..shifts_on_day.len() {
                    let (s1, s2) = (shifts_on_day[i], shifts_on_day[j]);
                    if !model.shifts()[s1].window.overlaps(model.shifts()[s2].window) {
                        continue;
                    }
                    let mut terms: Vec<_> =
                        vars.terms_for(w_idx, s1).iter().map(|v| v.scaled(1)).collect();
                    terms.extend(vars.terms_for(w_idx, s2).iter().map(|v| v.scaled(1)));
                    if !terms.is_empty() {
                        solver.add_constraint(cp::less_than_or_equals(terms, 1, tag)).post();
                    }
                }
            }
        }
    }
}

/// H4: a worker's total assigned hours never exceed `max_hours`.
pub fn post_max_hours(solver: &mut Solver, model: &Model, vars: &DecisionVars) {
    let tag = solver.new_constraint_tag();
    for (w_idx, worker) in model.workers().iter().enumerate() {
        let max_minutes = (worker.max_hours * 60.0).round() as i32;
        let mut terms = Vec::new();
        for (&s_idx, slot_vars) in &vars.by_worker_shift[w_idx] {
            let duration = model.shifts()[s_idx].window.duration_minutes() as i32;
            terms.extend(slot_vars.iter().map(|v| v.scaled(duration)));
        }
        if !terms.is_empty() {
            solver.add_constraint(cp::less_than_or_equals(terms, max_minutes, tag)).post();
        }
    }
}

/// H5/H6: weekly and (if set) per-day budget caps, against the already-built
/// `total_cost_var`/per-day cost sums so the objective can reuse the same
/// linear terms instead of recomputing them.
pub fn post_budget(
    solver: &mut Solver,
    model: &Model,
    vars: &DecisionVars,
    budget: &BudgetEnvelope,
    total_cost_cents: i32,
) {
    let tag = solver.new_constraint_tag();
    let mut total_terms = Vec::new();
    for w_idx in 0..model.workers().len() {
        for (&s_idx, slot_vars) in &vars.by_worker_shift[w_idx] {
            let cents = cost_cents(model, w_idx, s_idx);
            total_terms.extend(slot_vars.iter().map(|v| v.scaled(cents)));
        }
    }
    if !total_terms.is_empty() {
        solver
            .add_constraint(cp::less_than_or_equals(total_terms, total_cost_cents, tag))
            .post();
    }

    if let Some(max_daily) = budget.max_daily_cost {
        let max_daily_cents = decimal_to_cents(max_daily);
        for day in Day::ALL {
            let mut terms = Vec::new();
            for w_idx in 0..model.workers().len() {
                for (&s_idx, slot_vars) in &vars.by_worker_shift[w_idx] {
                    if model.shifts()[s_idx].day != day {
                        continue;
                    }
                    let cents = cost_cents(model, w_idx, s_idx);
                    terms.extend(slot_vars.iter().map(|v| v.scaled(cents)));
                }
            }
            if !terms.is_empty() {
                solver
                    .add_constraint(cp::less_than_or_equals(terms, max_daily_cents, tag))
                    .post();
            }
        }
    }
}

/// H7: no clopening — no worker's end→start gap across a day boundary (or
/// the Sunday→Monday wrap, §3.1) may fall under `min_rest_hours`. Scope
/// matches `seed::fits_rest` exactly: only cross-day gaps are checked here,
/// same-day back-to-back shifts are left to H3's overlap check.
pub fn post_rest(solver: &mut Solver, model: &Model, vars: &DecisionVars, min_rest_hours: f64) {
    let tag = solver.new_constraint_tag();
    for w_idx in 0..model.workers().len() {
        for day in Day::ALL {
            let next = day.next();
            for &s1 in &model.worker_day_shifts[w_idx][day.index()] {
                for &s2 in &model.worker_day_shifts[w_idx][next.index()] {
                    let end1 = model.shifts()[s1].window.end.minutes() as f64;
                    let start2 = model.shifts()[s2].window.start.minutes() as f64;
                    let gap_hours = ((1440.0 - end1) + start2) / 60.0;
                    if gap_hours >= min_rest_hours {
                        continue;
                    }
                    let mut terms: Vec<_> =
                        vars.terms_for(w_idx, s1).iter().map(|v| v.scaled(1)).collect();
                    terms.extend(vars.terms_for(w_idx, s2).iter().map(|v| v.scaled(1)));
                    if !terms.is_empty() {
                        solver.add_constraint(cp::less_than_or_equals(terms, 1, tag)).post();
                    }
                }
            }
        }
    }
}

/// H8: no more than `max_consecutive_days` consecutive worked days in any
/// rolling window of the repeating week, wrapping Sunday→Monday. Linearized
/// with per-day indicator variables `y[w,d]` (§4.4).
///
/// Returns the `y[w,d]` variables so the caller can reuse them if a future
/// objective term ever wants per-day worked indicators; today the objective
/// only needs the constraint side-effect.
pub fn post_consecutive_days(
    solver: &mut Solver,
    model: &Model,
    vars: &DecisionVars,
    max_consecutive_days: u32,
) {
    // max_consecutive_days is validated to lie in 1..=7; at 7 the window
    // (max_consecutive_days + 1) would be 8 days long, which never fits in
    // a 7-day repeating week, so the constraint is vacuously satisfied.
    if max_consecutive_days >= 7 {
        return;
    }
    let tag = solver.new_constraint_tag();
    let window_len = (max_consecutive_days + 1) as usize;

    for w_idx in 0..model.workers().len() {
        let y: Vec<DomainId> = (0..7).map(|_| solver.new_bounded_integer(0, 1)).collect();

        for day in Day::ALL {
            for &s_idx in &model.worker_day_shifts[w_idx][day.index()] {
                for &v in vars.terms_for(w_idx, s_idx) {
                    // v <= y[day]
                    let terms = vec![v.scaled(1), y[day.index()].scaled(-1)];
                    solver.add_constraint(cp::less_than_or_equals(terms, 0, tag)).post();
                }
            }
        }

        for start in 0..7 {
            let terms: Vec<_> = (0..window_len).map(|k| y[(start + k) % 7].scaled(1)).collect();
            solver
                .add_constraint(cp::less_than_or_equals(terms, max_consecutive_days as i32, tag))
                .post();
        }
    }
}

/// Scales a worker/shift's cost (§3 `cost[w,s]`) to integer cents.
pub fn cost_cents(model: &Model, worker: usize, shift: usize) -> i32 {
    decimal_to_cents(model.cost(worker, shift))
}

pub fn decimal_to_cents(amount: rust_decimal::Decimal) -> i32 {
    use rust_decimal::prelude::ToPrimitive;
    (amount * rust_decimal::Decimal::ONE_HUNDRED)
        .round()
        .to_i32()
        .unwrap_or(i32::MAX)
}
