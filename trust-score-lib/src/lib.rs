#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for trust-score
//!
//! This library computes a composite trust score for machine-learning artifacts: a model
//! URL plus optional code and dataset URLs. The primary repository is cloned once, a fixed
//! set of evaluators runs concurrently against the clone and a few external services, and
//! the results are folded into a weighted rating with per-evaluator latency.
//!
//! # Module Organization
//!
//! - [`sources`]: Entries, artifacts, and URL classification
//! - [`snapshot`]: Ephemeral shallow clones and the analyses that read them
//! - [`services`]: LLM and dataset-metadata clients
//! - [`scheduler`]: Bounded worker pool for CPU-bound analysis
//! - [`evaluators`]: The eight metric evaluators
//! - [`pipeline`]: Orchestration, aggregation, and the rating model
//! - [`cache`]: Rating reuse with TTL and single-flight recomputation
//! - [`config`]: TOML configuration with embedded defaults
//! - [`commands`]: Command-line interface

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod cache;
pub mod commands;
pub mod config;
pub mod evaluators;
pub mod pipeline;
pub mod scheduler;
pub mod services;
pub mod snapshot;
pub mod sources;

pub use crate::commands::{Host, run};
pub use crate::pipeline::{Rating, ScoringError, TrustScorer};
pub use crate::sources::Entry;
