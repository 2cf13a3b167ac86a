//! Input Validator & Normalizer (§4.1).
//!
//! `validate_and_normalize` is a pure function: `RawInput -> Instance |
//! EngineError`. It never partially constructs an `Instance` — either every
//! check passes and normalization (day canonicalization, availability
//! merging) completes, or the first failing check short-circuits with a
//! tagged error.

use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use crate::domain::{
    BudgetEnvelope, Day, FairnessEnvelope, Instance, Requirement, Shift, ShiftType, SolveConfig,
    Window, Worker, BUDGET_WARN_THRESHOLD, MAX_HOURLY_RATE, MAX_WEEKLY_HOURS, RATE_WARN_THRESHOLD,
};
use crate::dto::{EngineInput, RawRequirement, RawShift, RawWorker};
use crate::error::{EngineError, EngineResult};

#[instrument(skip_all, fields(workers = raw.workers.len(), shifts = raw.shifts.len()))]
pub fn validate_and_normalize(raw: EngineInput) -> EngineResult<Instance> {
    if raw.workers.is_empty() {
        return Err(EngineError::EmptyInput("workers"));
    }
    if raw.shifts.is_empty() {
        return Err(EngineError::EmptyInput("shifts"));
    }

    let mut warnings = Vec::new();

    let workers = validate_workers(raw.workers, &mut warnings)?;
    let shifts = validate_shifts(raw.shifts)?;
    let budget = validate_budget(raw.budget, &mut warnings)?;
    let fairness = validate_fairness(raw.fairness)?;
    let config = validate_constraints(raw.constraints);

    Ok(Instance {
        workers,
        shifts,
        budget,
        fairness,
        config,
        warnings,
    })
}

fn validate_workers(raw: Vec<RawWorker>, warnings: &mut Vec<String>) -> EngineResult<Vec<Worker>> {
    let mut seen_ids = HashSet::with_capacity(raw.len());
    let mut workers = Vec::with_capacity(raw.len());

    for w in raw {
        if !seen_ids.insert(w.id.clone()) {
            return Err(EngineError::DuplicateId { kind: "worker", id: w.id });
        }

        if !w.hourly_rate.is_finite() || w.hourly_rate < 0.0 {
            return Err(EngineError::range("hourly_rate", w.hourly_rate));
        }
        let mut rate = Decimal::try_from(w.hourly_rate)
            .map_err(|_| EngineError::range("hourly_rate", w.hourly_rate))?;
        if rate > Decimal::from(MAX_HOURLY_RATE) {
            rate = Decimal::from(MAX_HOURLY_RATE);
        }
        if rate > Decimal::from(RATE_WARN_THRESHOLD) {
            warnings.push(format!("worker {} has an unusually high hourly rate", w.id));
        }

        if !w.max_hours.is_finite() || w.max_hours <= 0.0 || w.max_hours > MAX_WEEKLY_HOURS {
            return Err(EngineError::range("max_hours", w.max_hours));
        }
        let min_hours = w.min_hours.unwrap_or(0.0);
        if !min_hours.is_finite() || min_hours < 0.0 || min_hours > w.max_hours {
            return Err(EngineError::range("min_hours", min_hours));
        }

        let skills: BTreeSet<String> = w.skills.into_iter().collect();
        let availability = normalize_availability(&w.id, w.availability)?;

        workers.push(Worker {
            id: w.id,
            skills,
            hourly_rate: rate,
            max_hours: w.max_hours,
            min_hours,
            availability,
        });
    }

    Ok(workers)
}

fn normalize_availability(
    worker_id: &str,
    raw: Vec<crate::dto::RawAvailabilityWindow>,
) -> EngineResult<[Vec<Window>; 7]> {
    let mut by_day: [Vec<Window>; 7] = Default::default();

    for w in raw {
        let day = Day::from_str(&w.day)?;
        let start = crate::domain::TimeOfDay::parse(&w.start_time)?;
        let end = crate::domain::TimeOfDay::parse(&w.end_time)?;
        if start >= end {
            return Err(EngineError::schema(
                "availability",
                format!("worker {worker_id}: start must be before end ({}-{})", w.start_time, w.end_time),
            ));
        }
        by_day[day.index()].push(Window::new(start, end));
    }

    for windows in by_day.iter_mut() {
        windows.sort_by_key(|w| w.start);
        let mut merged: Vec<Window> = Vec::with_capacity(windows.len());
        for &w in windows.iter() {
            match merged.last_mut() {
                Some(last) if w.start <= last.end => {
                    if w.end > last.end {
                        last.end = w.end;
                    }
                }
                _ => merged.push(w),
            }
        }
        *windows = merged;
    }

    Ok(by_day)
}

fn validate_shifts(raw: Vec<RawShift>) -> EngineResult<Vec<Shift>> {
    let mut seen_ids = HashSet::with_capacity(raw.len());
    let mut shifts = Vec::with_capacity(raw.len());

    for s in raw {
        if !seen_ids.insert(s.id.clone()) {
            return Err(EngineError::DuplicateId { kind: "shift", id: s.id });
        }

        let day = Day::from_str(&s.day)?;
        let start = crate::domain::TimeOfDay::parse(&s.start_time)?;
        let end = crate::domain::TimeOfDay::parse(&s.end_time)?;
        if start >= end {
            return Err(EngineError::schema(
                "shift",
                format!("shift {}: start must be before end", s.id),
            ));
        }

        let shift_type = match s.shift_type {
            Some(ref t) => ShiftType::from_str(t)?,
            None => ShiftType::Generic,
        };

        let requirements = validate_requirements(&s.id, s.requirements)?;

        shifts.push(Shift {
            id: s.id,
            day,
            window: Window::new(start, end),
            shift_type,
            requirements,
            requires_opening_duties: s.requires_opening_duties,
            requires_closing_duties: s.requires_closing_duties,
        });
    }

    Ok(shifts)
}

fn validate_requirements(shift_id: &str, raw: Vec<RawRequirement>) -> EngineResult<Vec<Requirement>> {
    if raw.is_empty() {
        return Err(EngineError::schema("requirements", format!("shift {shift_id} has no requirements")));
    }
    raw.into_iter()
        .map(|r| {
            if r.role.is_empty() {
                return Err(EngineError::schema("requirements.role", format!("shift {shift_id}: empty role")));
            }
            Ok(Requirement {
                role: r.role,
                count: r.count,
                required_skill: r.required_skill,
            })
        })
        .collect()
}

fn validate_budget(raw: crate::dto::RawBudget, warnings: &mut Vec<String>) -> EngineResult<BudgetEnvelope> {
    if !raw.max_total_cost.is_finite() || raw.max_total_cost <= 0.0 {
        return Err(EngineError::range("max_total_cost", raw.max_total_cost));
    }
    let max_total_cost = Decimal::try_from(raw.max_total_cost)
        .map_err(|_| EngineError::range("max_total_cost", raw.max_total_cost))?;

    let max_daily_cost = match raw.max_daily_cost {
        Some(v) if v.is_finite() && v > 0.0 => {
            let d = Decimal::try_from(v).map_err(|_| EngineError::range("max_daily_cost", v))?;
            if d > max_total_cost {
                return Err(EngineError::range("max_daily_cost", v));
            }
            Some(d)
        }
        Some(v) => return Err(EngineError::range("max_daily_cost", v)),
        None => None,
    };

    let target_cost = match raw.target_cost {
        Some(v) if v.is_finite() && v >= 0.0 => {
            let d = Decimal::try_from(v).map_err(|_| EngineError::range("target_cost", v))?;
            if d > max_total_cost {
                return Err(EngineError::range("target_cost", v));
            }
            Some(d)
        }
        Some(v) => return Err(EngineError::range("target_cost", v)),
        None => None,
    };

    if max_total_cost > Decimal::from(BUDGET_WARN_THRESHOLD) {
        warnings.push("max_total_cost exceeds $1,000,000".to_string());
    }

    Ok(BudgetEnvelope { max_total_cost, max_daily_cost, target_cost })
}

fn validate_fairness(raw: crate::dto::RawFairness) -> EngineResult<FairnessEnvelope> {
    if raw.max_consecutive_days == 0 || raw.max_consecutive_days > 7 {
        return Err(EngineError::range("max_consecutive_days", raw.max_consecutive_days));
    }
    if !raw.min_rest_hours.is_finite() || raw.min_rest_hours < 0.0 {
        return Err(EngineError::range("min_rest_hours", raw.min_rest_hours));
    }
    Ok(FairnessEnvelope {
        max_consecutive_days: raw.max_consecutive_days,
        min_rest_hours: raw.min_rest_hours,
        max_shift_imbalance: raw.max_shift_imbalance,
    })
}

fn validate_constraints(raw: crate::dto::RawConstraints) -> SolveConfig {
    if raw.time_limit == 0 {
        warn!("time_limit of 0 requested; the solver will run a single pass with no search budget");
    }
    SolveConfig {
        time_limit_secs: raw.time_limit,
        random_seed: raw.random_seed.unwrap_or(0),
        threads: raw.threads.unwrap_or(1).max(1),
        prefer_fairness: raw.prefer_fairness,
        allow_overtime: raw.allow_overtime,
    }
}
