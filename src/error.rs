//! Error taxonomy for the scheduling engine.
//!
//! Every stage of the pipeline (validate → build model → seed → solve →
//! post-process) returns `Result<_, EngineError>`. There is exactly one error
//! type so the CLI can map any failure to a single output envelope without a
//! conversion matrix.

use thiserror::Error;

/// The taxonomy from the error handling design: each variant carries enough
/// structure for the output envelope's `details` field (see `dto::FailureEnvelope`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("input is empty: {0}")]
    EmptyInput(&'static str),

    #[error("schema error in field `{field}`: {reason}")]
    SchemaError { field: String, reason: String },

    #[error("value out of range for field `{field}`: {value}")]
    RangeError { field: String, value: String },

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("budget cannot possibly cover minimum demand: min_cost={min_cost}, budget={budget}")]
    BudgetCoverageConflict {
        min_cost: rust_decimal::Decimal,
        budget: rust_decimal::Decimal,
    },

    #[error("no feasible schedule found after exhausting the relaxation ladder (last failing constraint: {last_failing_constraint})")]
    Infeasible { last_failing_constraint: String },

    #[error("internal solver error: {0}")]
    Internal(String),

    #[error("I/O error reading or writing engine JSON: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Validation-specific errors are all folded into `EngineError` above, but
/// the validator groups them under this kind tag for `SchemaError`/`RangeError`
/// construction so call sites stay terse.
impl EngineError {
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::SchemaError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn range(field: impl Into<String>, value: impl std::fmt::Display) -> Self {
        EngineError::RangeError {
            field: field.into(),
            value: value.to_string(),
        }
    }
}
