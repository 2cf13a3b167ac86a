//! Seed Builder — First-Fit-Decreasing construction heuristic (§4.3).
//!
//! Produces a high-quality initial assignment. `pumpkin-solver` has no
//! warm-start/hint entry point to hand this to as a search bias (see the
//! note on `solver::solve`), so today it serves one purpose: the fallback
//! `solver::solve` reports if the search times out without an incumbent of
//! its own.

use std::collections::HashSet;

use tracing::instrument;

use crate::domain::{Day, Window};
use crate::model::Model;

/// A single seeded assignment: worker `w` fills requirement `r` of shift `s`.
pub type SeedAssignment = (usize, usize, usize);

#[derive(Debug, Default)]
pub struct Seed {
    pub assigned: Vec<SeedAssignment>,
    pub assigned_set: HashSet<(usize, usize)>,
    /// `(shift_idx, requirement_idx, missing_count)` for requirement slots
    /// the seed could not fully fill (§4.3: "seed assigns what it can and
    /// records a partial-seed gap").
    pub partial_gaps: Vec<(usize, usize, u32)>,
}

impl Seed {
    pub fn is_assigned(&self, w: usize, s: usize) -> bool {
        self.assigned_set.contains(&(w, s))
    }
}

#[derive(Default, Clone)]
struct WorkerState {
    hours: f64,
    shift_count: u32,
    /// Shift indices assigned so far, grouped by day.
    by_day: [Vec<usize>; 7],
}

#[instrument(skip_all, fields(shifts = model.shifts().len()))]
pub fn build_seed(model: &Model) -> Seed {
    let n_workers = model.workers().len();
    let mut states: Vec<WorkerState> = vec![WorkerState::default(); n_workers];
    let mut seed = Seed::default();

    for &s_idx in &model.shifts_by_difficulty() {
        let shift = &model.shifts()[s_idx];
        let mut used_this_shift: HashSet<usize> = HashSet::new();

        for (r_idx, requirement) in shift.requirements.iter().enumerate() {
            let mut candidates: Vec<usize> = model.eligible_for_requirement[s_idx][r_idx]
                .iter()
                .copied()
                .filter(|w| !used_this_shift.contains(w))
                .collect();

            candidates.sort_by(|&a, &b| {
                let sa = &states[a];
                let sb = &states[b];
                sa.hours
                    .partial_cmp(&sb.hours)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| model.workers()[a].hourly_rate.cmp(&model.workers()[b].hourly_rate))
                    .then_with(|| model.workers()[a].id.cmp(&model.workers()[b].id))
            });

            let mut filled = 0u32;
            for w_idx in candidates {
                if filled >= requirement.count {
                    break;
                }
                if !fits(&states[w_idx], model, w_idx, shift.day, shift.window, shift.duration_hours()) {
                    continue;
                }
                states[w_idx].hours += shift.duration_hours();
                states[w_idx].shift_count += 1;
                states[w_idx].by_day[shift.day.index()].push(s_idx);

                used_this_shift.insert(w_idx);
                seed.assigned.push((w_idx, s_idx, r_idx));
                seed.assigned_set.insert((w_idx, s_idx));
                filled += 1;
            }

            if filled < requirement.count {
                seed.partial_gaps.push((s_idx, r_idx, requirement.count - filled));
            }
        }
    }

    seed
}

/// Checks I4 upper bound (max hours), I3 (no overlap), I6 (rest), and I7
/// (consecutive days) for tentatively adding `window` on `day` to `state`.
/// Seed construction never needs to check I4's *lower* bound — that is
/// enforced softly (§4.4 O5) and left to the solver.
fn fits(state: &WorkerState, model: &Model, w_idx: usize, day: Day, window: Window, duration_hours: f64) -> bool {
    let fairness = &model.instance.fairness;

    if state.hours + duration_hours > model.workers()[w_idx].max_hours {
        return false;
    }

    if state.by_day[day.index()]
        .iter()
        .any(|&other| model.shifts()[other].window.overlaps(window))
    {
        return false;
    }

    if !fits_rest(state, model, day, window, fairness.min_rest_hours) {
        return false;
    }

    if !fits_consecutive(state, day, fairness.max_consecutive_days) {
        return false;
    }

    true
}

fn fits_rest(state: &WorkerState, model: &Model, day: Day, window: Window, min_rest_hours: f64) -> bool {
    let prev = Day::ALL[(day.index() + 6) % 7];
    let next = day.next();

    for &other in &state.by_day[prev.index()] {
        let other_end = model.shifts()[other].window.end.minutes() as f64;
        let gap_minutes = (1440.0 - other_end) + window.start.minutes() as f64;
        if gap_minutes / 60.0 < min_rest_hours {
            return false;
        }
    }
    for &other in &state.by_day[next.index()] {
        let other_start = model.shifts()[other].window.start.minutes() as f64;
        let gap_minutes = (1440.0 - window.end.minutes() as f64) + other_start;
        if gap_minutes / 60.0 < min_rest_hours {
            return false;
        }
    }
    true
}

fn fits_consecutive(state: &WorkerState, day: Day, max_consecutive_days: u32) -> bool {
    let mut worked = [false; 7];
    for d in 0..7 {
        worked[d] = !state.by_day[d].is_empty();
    }
    worked[day.index()] = true;

    longest_circular_run(&worked) <= max_consecutive_days as usize
}

/// Longest run of `true` in a length-7 circular boolean array.
fn longest_circular_run(worked: &[bool; 7]) -> usize {
    if worked.iter().all(|&b| b) {
        return 7;
    }
    let mut best = 0;
    let mut current = 0;
    // Walk twice around to capture runs that wrap past index 6 -> 0.
    for i in 0..14 {
        if worked[i % 7] {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best.min(7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_run_wraps_across_week_boundary() {
        let mut worked = [false; 7];
        worked[5] = true; // Saturday
        worked[6] = true; // Sunday
        worked[0] = true; // Monday
        assert_eq!(longest_circular_run(&worked), 3);
    }

    #[test]
    fn circular_run_all_true_is_seven() {
        assert_eq!(longest_circular_run(&[true; 7]), 7);
    }

    #[test]
    fn circular_run_all_false_is_zero() {
        assert_eq!(longest_circular_run(&[false; 7]), 0);
    }
}
