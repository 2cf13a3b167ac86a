//! Wire types for the file-in/file-out JSON contract (§6).
//!
//! Kept deliberately separate from `domain`: the JSON schema is a promise to
//! the external job runner and must not move just because the optimization
//! core's internal types do.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Input
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawAvailabilityWindow {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWorker {
    pub id: String,
    pub skills: Vec<String>,
    pub hourly_rate: f64,
    pub max_hours: f64,
    #[serde(default)]
    pub min_hours: Option<f64>,
    #[serde(default)]
    pub availability: Vec<RawAvailabilityWindow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRequirement {
    pub role: String,
    pub count: u32,
    #[serde(default)]
    pub required_skill: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShift {
    pub id: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub shift_type: Option<String>,
    #[serde(default)]
    pub requires_opening_duties: bool,
    #[serde(default)]
    pub requires_closing_duties: bool,
    pub requirements: Vec<RawRequirement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBudget {
    pub max_total_cost: f64,
    #[serde(default)]
    pub max_daily_cost: Option<f64>,
    #[serde(default)]
    pub target_cost: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFairness {
    pub max_consecutive_days: u32,
    pub min_rest_hours: f64,
    #[serde(default)]
    pub max_shift_imbalance: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConstraints {
    pub time_limit: u64,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub prefer_fairness: bool,
    #[serde(default)]
    pub allow_overtime: bool,
    #[serde(default)]
    pub threads: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineInput {
    pub workers: Vec<RawWorker>,
    pub shifts: Vec<RawShift>,
    pub budget: RawBudget,
    pub fairness: RawFairness,
    pub constraints: RawConstraints,
}

// ============================================================================
// Output — success
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentDto {
    pub worker_id: String,
    pub shift_id: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_hours: f64,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsDto {
    pub num_workers_used: usize,
    pub avg_hours_per_worker: f64,
    pub max_shift_imbalance: u32,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolveStatusDto {
    Optimal,
    Feasible,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolutionDto {
    pub assignments: Vec<AssignmentDto>,
    pub total_cost: Decimal,
    pub budget_utilization: f64,
    pub solve_time: f64,
    pub status: SolveStatusDto,
    pub relaxations_applied: Vec<String>,
    pub statistics: StatisticsDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum GapReasonDto {
    NoEligibleWorkers,
    AllEligibleAtCap,
    BudgetExhaustedForDay,
    OverlapBlocked,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageGapDto {
    pub shift_id: String,
    pub day: String,
    pub window: String,
    pub missing_count: u32,
    pub role: String,
    pub required_skill: Option<String>,
    pub eligible_worker_count: usize,
    pub reason: GapReasonDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub success: bool,
    pub solution: SolutionDto,
    pub coverage_gaps: Vec<CoverageGapDto>,
    pub messages: Vec<String>,
}

// ============================================================================
// Output — failure
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum FailureReasonDto {
    Infeasible,
    BudgetCoverageConflict,
    ValidationError,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub success: bool,
    pub reason: FailureReasonDto,
    pub details: HashMap<String, serde_json::Value>,
    pub coverage_gaps: Vec<CoverageGapDto>,
    pub messages: Vec<String>,
}

/// Either terminal envelope; exactly one is written to the output file on
/// every clean termination (§7 policy).
#[derive(Debug, Clone)]
pub enum EngineOutcome {
    Success(SuccessEnvelope),
    Failure(FailureEnvelope),
}

impl EngineOutcome {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            EngineOutcome::Success(s) => serde_json::to_value(s),
            EngineOutcome::Failure(f) => serde_json::to_value(f),
        }
        .expect("envelope types are always representable as JSON")
    }
}
