//! Domain model for the workforce scheduling engine.
//!
//! These are the validated, normalized types the rest of the pipeline works
//! with (§3 of the spec) — distinct from the wire DTOs in `dto`, so a schema
//! change on the JSON edge never forces a change here.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Hourly rates are capped here on ingest (§3 Worker invariant).
pub const MAX_HOURLY_RATE: i64 = 999;
/// Warn (non-fatal) threshold for unusually high rates.
pub const RATE_WARN_THRESHOLD: i64 = 500;
/// Warn (non-fatal) threshold for unusually large budgets.
pub const BUDGET_WARN_THRESHOLD: i64 = 1_000_000;
/// Upper bound on `max_hours` (§3: `max_hours ≤ 168`, hours in a week).
pub const MAX_WEEKLY_HOURS: f64 = 168.0;

/// A weekday, canonicalized to title case. The problem models a single
/// repeating week — there are no calendar dates anywhere in the schema — so
/// "contiguous days" wrap modulo 7 (§3.1 of the expanded spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&d| d == self).expect("Day is always in ALL")
    }

    /// The next day, wrapping Sunday -> Monday.
    pub fn next(self) -> Day {
        Self::ALL[(self.index() + 1) % 7]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().to_ascii_lowercase() == lower)
            .ok_or_else(|| EngineError::schema("day", format!("unrecognized day string: {s}")))
    }
}

/// Minutes since midnight. `end` may be `1440` ("24:00", end of day);
/// overnight shifts that would conceptually spill past midnight are out of
/// scope (§3) and are never produced by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(pub u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(1440);

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| EngineError::schema("time", format!("not HH:MM: {s}")))?;
        let h: u16 = h
            .parse()
            .map_err(|_| EngineError::schema("time", format!("bad hour: {s}")))?;
        let m: u16 = m
            .parse()
            .map_err(|_| EngineError::schema("time", format!("bad minute: {s}")))?;
        if m >= 60 || h > 24 || (h == 24 && m != 0) {
            return Err(EngineError::schema("time", format!("out of range: {s}")));
        }
        Ok(TimeOfDay(h * 60 + m))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = EngineError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeOfDay::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// A half-open `[start, end)` window on a given day, used both for worker
/// availability and for a shift's own time span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Window {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn duration_minutes(self) -> u32 {
        self.end.minutes() as u32 - self.start.minutes() as u32
    }

    pub fn duration_hours(self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }

    pub fn contains(self, other: Window) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(self, other: Window) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A worker's availability on a single day: zero or more disjoint, sorted
/// windows (overlapping input windows are merged at validation time).
pub type DayAvailability = Vec<Window>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub skills: BTreeSet<String>,
    pub hourly_rate: Decimal,
    pub max_hours: f64,
    pub min_hours: f64,
    /// Indexed by `Day::index()`; normalized (merged, sorted) by the validator.
    pub availability: [DayAvailability; 7],
}

impl Worker {
    pub fn availability_on(&self, day: Day) -> &[Window] {
        &self.availability[day.index()]
    }

    pub fn is_available_for(&self, day: Day, window: Window) -> bool {
        self.availability_on(day).iter().any(|w| w.contains(window))
    }
}

/// A closed set of shift-type tags (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Prep,
    Opening,
    Lunch,
    Dinner,
    Closing,
    Generic,
}

impl Default for ShiftType {
    fn default() -> Self {
        ShiftType::Generic
    }
}

impl FromStr for ShiftType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prep" => Ok(ShiftType::Prep),
            "opening" => Ok(ShiftType::Opening),
            "lunch" => Ok(ShiftType::Lunch),
            "dinner" => Ok(ShiftType::Dinner),
            "closing" => Ok(ShiftType::Closing),
            "generic" => Ok(ShiftType::Generic),
            other => Err(EngineError::schema("shift_type", format!("unknown shift type: {other}"))),
        }
    }
}

/// One staffing requirement line on a shift: `count` workers filling `role`,
/// optionally gated on an additional `required_skill`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub role: String,
    pub count: u32,
    #[serde(default)]
    pub required_skill: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: String,
    pub day: Day,
    pub window: Window,
    #[serde(default)]
    pub shift_type: ShiftType,
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub requires_opening_duties: bool,
    #[serde(default)]
    pub requires_closing_duties: bool,
}

impl Shift {
    pub fn duration_hours(&self) -> f64 {
        self.window.duration_hours()
    }

    pub fn headcount(&self) -> u32 {
        self.requirements.iter().map(|r| r.count).sum()
    }

    /// A worker is eligible for this shift iff some requirement's role is one
    /// of the worker's skills (and, if the requirement names an additional
    /// required skill, the worker also has that skill) — §3 Eligibility
    /// relation, availability half handled by the caller.
    pub fn matches_skills(&self, worker: &Worker) -> bool {
        self.requirements.iter().any(|r| {
            worker.skills.contains(&r.role)
                && r.required_skill
                    .as_deref()
                    .map(|skill| worker.skills.contains(skill))
                    .unwrap_or(true)
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetEnvelope {
    pub max_total_cost: Decimal,
    pub max_daily_cost: Option<Decimal>,
    pub target_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FairnessEnvelope {
    pub max_consecutive_days: u32,
    pub min_rest_hours: f64,
    pub max_shift_imbalance: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolveConfig {
    pub time_limit_secs: u64,
    pub random_seed: u64,
    pub threads: u32,
    pub prefer_fairness: bool,
    pub allow_overtime: bool,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 60,
            random_seed: 0,
            threads: 1,
            prefer_fairness: false,
            allow_overtime: false,
        }
    }
}

/// The fully validated, normalized problem instance handed to the model
/// builder. Immutable through the rest of the solve (§3 Lifecycle).
#[derive(Debug, Clone)]
pub struct Instance {
    pub workers: Vec<Worker>,
    pub shifts: Vec<Shift>,
    pub budget: BudgetEnvelope,
    pub fairness: FairnessEnvelope,
    pub config: SolveConfig,
    /// Non-fatal warnings accumulated during validation (§4.1).
    pub warnings: Vec<String>,
}
