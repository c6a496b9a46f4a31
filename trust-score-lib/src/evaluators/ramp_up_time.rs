//! How quickly a newcomer can get productive with the repository.

use super::LOG_TARGET;
use super::evaluator::{EvalContext, EvaluatorError, Score};
use crate::services::DEFAULT_CHAT_RESPONSE;
use crate::snapshot::RampUpSignals;
use regex::Regex;
use std::sync::LazyLock;

const CLARITY_WEIGHT: f64 = 0.6;
const EXAMPLES_WEIGHT: f64 = 0.25;
const DEPENDENCIES_WEIGHT: f64 = 0.15;

/// Clarity assumed when the model gives no usable rating.
pub const DEFAULT_CLARITY: f64 = 0.5;

/// Only the start of a README is sent to the model.
const MAX_README_CHARS: usize = 12_000;

const CLARITY_PROMPT: &str = "\
Rate how easy it would be for a new engineer to start using the project described by the
following README. Consider installation instructions, usage examples, and overall clarity.
Answer with a single number between 0 and 1 and nothing else.

README:
";

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(\.\d+)?|\.\d+").expect("valid regex"));

/// Read a clarity rating out of a model answer, clamped to [0, 1].
#[must_use]
pub fn parse_clarity(answer: &str) -> Option<f64> {
    let answer = answer.trim();
    if answer == DEFAULT_CHAT_RESPONSE {
        return None;
    }

    let value = answer
        .parse::<f64>()
        .ok()
        .or_else(|| FIRST_NUMBER.find(answer).and_then(|m| m.as_str().parse::<f64>().ok()))?;

    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

#[must_use]
pub fn ramp_up_score(clarity: f64, signals: RampUpSignals) -> f64 {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    (CLARITY_WEIGHT * clarity + EXAMPLES_WEIGHT * flag(signals.has_examples) + DEPENDENCIES_WEIGHT * flag(signals.has_dependencies))
        .clamp(0.0, 1.0)
}

pub(super) fn truncate_readme(readme: &str) -> &str {
    match readme.char_indices().nth(MAX_README_CHARS) {
        Some((idx, _)) => &readme[..idx],
        None => readme,
    }
}

async fn rate_clarity(ctx: &EvalContext<'_>) -> f64 {
    let Some(readme) = ctx.readme.filter(|r| !r.trim().is_empty()) else {
        return DEFAULT_CLARITY;
    };

    let prompt = format!("{CLARITY_PROMPT}{}", truncate_readme(readme));
    match ctx.llm.chat(&prompt).await {
        Ok(answer) => parse_clarity(&answer).unwrap_or_else(|| {
            log::debug!(target: LOG_TARGET, "No clarity rating in LLM answer, assuming {DEFAULT_CLARITY}");
            DEFAULT_CLARITY
        }),
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not rate README clarity: {e:#}");
            DEFAULT_CLARITY
        }
    }
}

pub(super) async fn evaluate(ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
    let reader = ctx.reader()?;
    let (clarity, signals) = tokio::join!(rate_clarity(ctx), ctx.on_pool(move || reader.analyze_ramp_up_signals()));
    Ok(Score::Value(ramp_up_score(clarity, signals?)))
}
