//! The independent scoring units run against each entry.
//!
//! Every evaluator reads the shared repository snapshot and/or an external service and
//! produces one bounded [`Score`]. Evaluators never see each other's results; a failing
//! evaluator is replaced by its [`Evaluator::fallback`] score without affecting the rest.

mod bus_factor;
mod code_quality;
mod dataset_and_code;
mod dataset_quality;
mod evaluator;
mod license;
mod performance_claims;
mod ramp_up_time;
mod size;

pub use code_quality::code_quality_score;
pub use dataset_and_code::{DatasetCodeIndicators, detect as detect_dataset_and_code, has_code_repository_link, link_fallback};
pub use dataset_quality::{UNKNOWN_HOST_SCORE, dataset_quality_score, find_dataset_reference, score_dataset_url};
pub use evaluator::{EvalContext, Evaluator, EvaluatorError, MetricName, Score};
pub use license::{classify_license, extract_license_text};
pub use performance_claims::parse_claims;
pub use ramp_up_time::{DEFAULT_CLARITY, parse_clarity, ramp_up_score};
pub use size::SizeScore;

const LOG_TARGET: &str = "evaluators";
