//! Demo data generators.
//!
//! `Scenario` builds the six boundary-scenario fixtures from §8 as full
//! [`EngineInput`] values, so `tests/scenarios.rs` exercises the real JSON
//! contract end to end rather than hand-assembling `Instance`s. `DemoSize`
//! builds larger, randomized fixtures for `src/bin/bench.rs`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::dto::{
    EngineInput, RawAvailabilityWindow, RawBudget, RawConstraints, RawFairness, RawRequirement,
    RawShift, RawWorker,
};

const ALL_DAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

fn worker(id: &str, skills: &[&str], hourly_rate: f64, max_hours: f64, min_hours: f64) -> RawWorker {
    let availability = ALL_DAYS
        .iter()
        .map(|&day| RawAvailabilityWindow {
            day: day.to_string(),
            start_time: "00:00".to_string(),
            end_time: "24:00".to_string(),
        })
        .collect();
    RawWorker {
        id: id.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        hourly_rate,
        max_hours,
        min_hours: Some(min_hours),
        availability,
    }
}

fn shift(id: &str, day: &str, start: &str, end: &str, role: &str, count: u32) -> RawShift {
    RawShift {
        id: id.to_string(),
        day: day.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        shift_type: None,
        requires_opening_duties: false,
        requires_closing_duties: false,
        requirements: vec![RawRequirement { role: role.to_string(), count, required_skill: None }],
    }
}

fn shift_with_skill(
    id: &str,
    day: &str,
    start: &str,
    end: &str,
    role: &str,
    count: u32,
    required_skill: &str,
) -> RawShift {
    RawShift {
        id: id.to_string(),
        day: day.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        shift_type: None,
        requires_opening_duties: false,
        requires_closing_duties: false,
        requirements: vec![RawRequirement {
            role: role.to_string(),
            count,
            required_skill: Some(required_skill.to_string()),
        }],
    }
}

/// The six named boundary scenarios from §8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    HappyPath,
    BudgetConflict,
    InfeasibleSingleWorker,
    RelaxationLadder,
    SkillScarcity,
    Determinism,
}

impl Scenario {
    pub fn build(self) -> EngineInput {
        match self {
            Scenario::HappyPath => happy_path(8000.0, Some(1200.0)),
            Scenario::BudgetConflict => happy_path(500.0, Some(1200.0)),
            Scenario::InfeasibleSingleWorker => infeasible_single_worker(),
            Scenario::RelaxationLadder => relaxation_ladder(),
            Scenario::SkillScarcity => skill_scarcity(),
            // Identical to the happy path; determinism is about running it
            // twice with the same seed, not a different fixture.
            Scenario::Determinism => happy_path(8000.0, Some(1200.0)),
        }
    }
}

/// 15 workers covering Server/Cook/Host across three shifts a day, 21 shifts
/// total (one per day x 3), weekly budget and optional daily cap as given.
fn happy_path(max_total_cost: f64, max_daily_cost: Option<f64>) -> EngineInput {
    let mut workers = Vec::new();
    for i in 0..15 {
        let role = match i % 3 {
            0 => "Server",
            1 => "Cook",
            _ => "Host",
        };
        workers.push(worker(&format!("w{i}"), &[role], 18.0 + (i % 5) as f64, 40.0, 10.0));
    }

    let mut shifts = Vec::new();
    for day in ALL_DAYS {
        shifts.push(shift(&format!("{day}-lunch"), day, "10:00", "16:00", "Server", 2));
        shifts.push(shift(&format!("{day}-cook"), day, "10:00", "18:00", "Cook", 1));
        shifts.push(shift(&format!("{day}-host"), day, "16:00", "22:00", "Host", 1));
    }

    EngineInput {
        workers,
        shifts,
        budget: RawBudget { max_total_cost, max_daily_cost, target_cost: None },
        fairness: RawFairness { max_consecutive_days: 5, min_rest_hours: 12.0, max_shift_imbalance: None },
        constraints: RawConstraints {
            time_limit: 10,
            random_seed: Some(42),
            prefer_fairness: false,
            allow_overtime: false,
            threads: Some(1),
        },
    }
}

/// One worker, 100 one-person shifts spread across the week, no budget or
/// fairness pressure — the worker simply cannot be in a hundred places, so
/// every slot beyond what fits in `max_hours` reports `AllEligibleAtCap`.
fn infeasible_single_worker() -> EngineInput {
    let workers = vec![worker("solo", &["Server"], 20.0, 40.0, 0.0)];

    let mut shifts = Vec::new();
    for i in 0..100 {
        let day = ALL_DAYS[i % 7];
        let hour = (i / 7) % 20;
        shifts.push(shift(
            &format!("s{i}"),
            day,
            &format!("{:02}:00", hour),
            &format!("{:02}:00", hour + 1),
            "Server",
            1,
        ));
    }

    EngineInput {
        workers,
        shifts,
        budget: RawBudget { max_total_cost: 1_000_000.0, max_daily_cost: None, target_cost: None },
        fairness: RawFairness { max_consecutive_days: 7, min_rest_hours: 0.0, max_shift_imbalance: None },
        constraints: RawConstraints {
            time_limit: 10,
            random_seed: Some(1),
            prefer_fairness: false,
            allow_overtime: false,
            threads: Some(1),
        },
    }
}

/// Feasible only once the daily budget cap is dropped: one day's demand
/// alone costs more than `max_daily_cost`, but the week as a whole fits
/// comfortably under `max_total_cost`.
fn relaxation_ladder() -> EngineInput {
    let workers: Vec<_> = (0..5)
        .map(|i| worker(&format!("w{i}"), &["Server"], 25.0, 40.0, 0.0))
        .collect();

    let mut shifts = Vec::new();
    for day in ALL_DAYS {
        let count = if day == "Saturday" { 5 } else { 1 };
        shifts.push(shift(&format!("{day}-shift"), day, "09:00", "17:00", "Server", count));
    }

    EngineInput {
        workers,
        shifts,
        budget: RawBudget { max_total_cost: 3000.0, max_daily_cost: Some(400.0), target_cost: None },
        fairness: RawFairness { max_consecutive_days: 7, min_rest_hours: 8.0, max_shift_imbalance: None },
        constraints: RawConstraints {
            time_limit: 10,
            random_seed: Some(7),
            prefer_fairness: false,
            allow_overtime: false,
            threads: Some(1),
        },
    }
}

/// Ten workers, none of them a Sommelier, plus one shift that requires one —
/// everything else is easily staffed by the same ten workers.
fn skill_scarcity() -> EngineInput {
    let workers: Vec<_> = (0..10)
        .map(|i| worker(&format!("w{i}"), &["Server"], 20.0, 40.0, 0.0))
        .collect();

    let mut shifts = vec![shift_with_skill(
        "wine-tasting", "Friday", "18:00", "22:00", "Server", 1, "Sommelier",
    )];
    for day in ALL_DAYS {
        shifts.push(shift(&format!("{day}-floor"), day, "10:00", "16:00", "Server", 2));
    }

    EngineInput {
        workers,
        shifts,
        budget: RawBudget { max_total_cost: 10_000.0, max_daily_cost: None, target_cost: None },
        fairness: RawFairness { max_consecutive_days: 6, min_rest_hours: 10.0, max_shift_imbalance: None },
        constraints: RawConstraints {
            time_limit: 10,
            random_seed: Some(3),
            prefer_fairness: false,
            allow_overtime: false,
            threads: Some(1),
        },
    }
}

/// Randomized fixture sizes for `src/bin/bench.rs`; not part of the §8
/// boundary scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoSize {
    Small,
    Large,
}

impl DemoSize {
    fn parameters(self) -> (usize, usize) {
        match self {
            DemoSize::Small => (15, 21),
            DemoSize::Large => (200, 500),
        }
    }

    pub fn build(self) -> EngineInput {
        let (worker_count, shift_count) = self.parameters();
        let mut rng = StdRng::seed_from_u64(match self {
            DemoSize::Small => 1,
            DemoSize::Large => 2,
        });

        let roles = ["Server", "Cook", "Host", "Bartender"];
        let workers: Vec<_> = (0..worker_count)
            .map(|i| {
                let role = roles[i % roles.len()];
                let rate = rng.gen_range(15.0..35.0);
                worker(&format!("w{i}"), &[role], rate, 40.0, 0.0)
            })
            .collect();

        let mut shifts = Vec::new();
        for i in 0..shift_count {
            let day = ALL_DAYS[i % 7];
            let role = roles[i % roles.len()];
            let start_hour = 6 + (i % 14);
            let count = 1 + (i % 3) as u32;
            shifts.push(shift(
                &format!("s{i}"),
                day,
                &format!("{:02}:00", start_hour),
                &format!("{:02}:00", start_hour + 4),
                role,
                count,
            ));
        }
        shifts.shuffle(&mut rng);

        EngineInput {
            workers,
            shifts,
            budget: RawBudget {
                max_total_cost: worker_count as f64 * 2000.0,
                max_daily_cost: None,
                target_cost: None,
            },
            fairness: RawFairness { max_consecutive_days: 6, min_rest_hours: 10.0, max_shift_imbalance: None },
            constraints: RawConstraints {
                time_limit: 30,
                random_seed: Some(42),
                prefer_fairness: false,
                allow_overtime: false,
                threads: Some(1),
            },
        }
    }
}
