//! Workforce scheduling engine.
//!
//! Given a set of workers, shifts, and a budget/fairness envelope, produces a
//! cost-optimized assignment or a structured infeasibility report. The
//! pipeline is Validator -> Model -> Seed Builder -> Constraint Solver ->
//! Post-Processor, composed by [`pipeline::run_pipeline`].

pub mod constraints;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod seed;
pub mod solver;
pub mod validate;
