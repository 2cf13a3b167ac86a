//! Problem Model (§4.2): the data model plus derived tables built once, pure
//! functions of the validated `Instance`. Immutable after `Model::build`; the
//! solver reads from it but never mutates it (§2).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::instrument;

use crate::domain::{Day, Instance, Shift, Window, Worker};

/// Fixed difficulty-score weights (§4.3), exposed as constants so tests can
/// assert the exact baseline the spec pins down.
pub struct DifficultyWeights;
impl DifficultyWeights {
    pub const HEADCOUNT: f64 = 1.0;
    pub const SKILL_RARITY: f64 = 2.0;
    pub const TIME_PRESSURE: f64 = 1.5;
    pub const DUTY_WEIGHT: f64 = 0.5;
}

/// A `(worker_idx, shift_idx)` pair, used for eligibility-set membership.
pub type Pair = (usize, usize);

pub struct Model {
    pub instance: Instance,

    /// Per shift: sorted worker indices eligible for *some* requirement of
    /// that shift, by skill + availability (§3 Eligibility relation E).
    pub eligible_workers: Vec<Vec<usize>>,
    /// Per shift, per requirement index: sorted worker indices eligible for
    /// that specific requirement slot (§4.4 H2 requirement-level modeling).
    pub eligible_for_requirement: Vec<Vec<Vec<usize>>>,
    /// Fast membership test mirroring `eligible_workers`.
    eligibility_set: HashSet<Pair>,

    /// Per shift: other shift indices on the same day whose windows overlap
    /// (§3 Overlap relation O).
    pub overlap: Vec<Vec<usize>>,

    /// Per worker, per day: shift indices that worker is eligible for on that
    /// day (used by the seed builder and by H3/H7/H8 constraint assembly).
    pub worker_day_shifts: Vec<[Vec<usize>; 7]>,

    /// `cost[w][s]` is only populated for eligible pairs, indexed in lockstep
    /// with `eligible_workers[s]` via `cost_index`.
    cost_index: Vec<std::collections::HashMap<usize, Decimal>>,

    /// Difficulty score per shift (§4.3), higher = schedule first.
    pub difficulty: Vec<f64>,

    /// Shifts with zero eligible workers despite having requirements — these
    /// never become decision variables and are pre-marked infeasible (§4.2
    /// invariant).
    pub empty_eligibility_shifts: Vec<usize>,
}

impl Model {
    #[instrument(skip_all, fields(workers = instance.workers.len(), shifts = instance.shifts.len()))]
    pub fn build(instance: Instance) -> Model {
        let n_workers = instance.workers.len();
        let n_shifts = instance.shifts.len();

        let mut eligible_workers = vec![Vec::new(); n_shifts];
        let mut eligible_for_requirement = vec![Vec::new(); n_shifts];
        let mut eligibility_set = HashSet::new();
        let mut cost_index: Vec<std::collections::HashMap<usize, Decimal>> =
            vec![std::collections::HashMap::new(); n_shifts];
        let mut worker_day_shifts: Vec<[Vec<usize>; 7]> = vec![Default::default(); n_workers];
        let mut empty_eligibility_shifts = Vec::new();

        for (s_idx, shift) in instance.shifts.iter().enumerate() {
            eligible_for_requirement[s_idx] = vec![Vec::new(); shift.requirements.len()];

            for (w_idx, worker) in instance.workers.iter().enumerate() {
                if !worker.is_available_for(shift.day, shift.window) {
                    continue;
                }
                let mut any_requirement_matched = false;
                for (r_idx, req) in shift.requirements.iter().enumerate() {
                    let role_ok = worker.skills.contains(&req.role);
                    let skill_ok = req
                        .required_skill
                        .as_deref()
                        .map(|sk| worker.skills.contains(sk))
                        .unwrap_or(true);
                    if role_ok && skill_ok {
                        eligible_for_requirement[s_idx][r_idx].push(w_idx);
                        any_requirement_matched = true;
                    }
                }
                if any_requirement_matched {
                    eligible_workers[s_idx].push(w_idx);
                    eligibility_set.insert((w_idx, s_idx));
                    let cost = cost_of(worker, shift);
                    cost_index[s_idx].insert(w_idx, cost);
                    worker_day_shifts[w_idx][shift.day.index()].push(s_idx);
                }
            }

            if eligible_workers[s_idx].is_empty() && !shift.requirements.is_empty() {
                empty_eligibility_shifts.push(s_idx);
            }
        }

        let overlap = build_overlap(&instance.shifts);
        let difficulty = build_difficulty(&instance.shifts, &eligible_workers, &instance.workers);

        Model {
            instance,
            eligible_workers,
            eligible_for_requirement,
            eligibility_set,
            overlap,
            worker_day_shifts,
            cost_index,
            difficulty,
            empty_eligibility_shifts,
        }
    }

    pub fn workers(&self) -> &[Worker] {
        &self.instance.workers
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.instance.shifts
    }

    pub fn is_eligible(&self, w: usize, s: usize) -> bool {
        self.eligibility_set.contains(&(w, s))
    }

    pub fn cost(&self, w: usize, s: usize) -> Decimal {
        self.cost_index[s]
            .get(&w)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn cost_f64(&self, w: usize, s: usize) -> f64 {
        self.cost(w, s).to_f64().unwrap_or(0.0)
    }

    /// Shifts in descending-difficulty order, ties broken by `(day, start,
    /// id)` (§4.3), the canonical order both the seed builder and the
    /// solver's variable registration walk.
    pub fn shifts_by_difficulty(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.shifts().len()).collect();
        order.sort_by(|&a, &b| {
            let da = self.difficulty[a];
            let db = self.difficulty[b];
            db.partial_cmp(&da)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.shifts()[a].day.cmp(&self.shifts()[b].day))
                .then_with(|| self.shifts()[a].window.start.cmp(&self.shifts()[b].window.start))
                .then_with(|| self.shifts()[a].id.cmp(&self.shifts()[b].id))
        });
        order
    }
}

fn cost_of(worker: &Worker, shift: &Shift) -> Decimal {
    let hours = Decimal::from_f64_retain(shift.duration_hours()).unwrap_or(Decimal::ZERO);
    worker.hourly_rate * hours
}

fn build_overlap(shifts: &[Shift]) -> Vec<Vec<usize>> {
    let mut overlap = vec![Vec::new(); shifts.len()];
    for day in Day::ALL {
        let on_day: Vec<usize> = shifts
            .iter()
            .enumerate()
            .filter(|(_, s)| s.day == day)
            .map(|(i, _)| i)
            .collect();
        for (pos, &i) in on_day.iter().enumerate() {
            for &j in &on_day[pos + 1..] {
                if windows_overlap(shifts[i].window, shifts[j].window) {
                    overlap[i].push(j);
                    overlap[j].push(i);
                }
            }
        }
    }
    overlap
}

fn windows_overlap(a: Window, b: Window) -> bool {
    a.overlaps(b)
}

fn build_difficulty(shifts: &[Shift], _eligible_workers: &[Vec<usize>], workers: &[Worker]) -> Vec<f64> {
    let longest_window = shifts
        .iter()
        .map(|s| s.duration_hours())
        .fold(1.0_f64, f64::max);

    shifts
        .iter()
        .map(|s| {
            let headcount = s.headcount() as f64;

            let skill_match_count = workers.iter().filter(|wk| s.matches_skills(wk)).count().max(1);
            let skill_rarity = 1.0 / skill_match_count as f64;

            // Time pressure: shorter windows relative to the longest shift in
            // the batch are under more scheduling pressure.
            let slack = (longest_window - s.duration_hours()).max(0.0);
            let time_pressure = 1.0 / (1.0 + slack);

            let duty_weight = (s.requires_opening_duties as u8 + s.requires_closing_duties as u8) as f64;

            DifficultyWeights::HEADCOUNT * headcount
                + DifficultyWeights::SKILL_RARITY * skill_rarity
                + DifficultyWeights::TIME_PRESSURE * time_pressure
                + DifficultyWeights::DUTY_WEIGHT * duty_weight
        })
        .collect()
}
