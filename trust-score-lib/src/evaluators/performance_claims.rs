use super::evaluator::{EvalContext, EvaluatorError, Score};
use super::ramp_up_time::truncate_readme;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const BENCHMARKS_WEIGHT: f64 = 0.5;
const METRICS_WEIGHT: f64 = 0.5;

const CLAIMS_PROMPT: &str = r#"
Read the README below and decide whether it backs up its performance claims.
Reply with JSON only, in exactly this form:
{"mentions_benchmarks": <0 or 1>, "has_metrics": <0 or 1>}
where mentions_benchmarks is 1 if the README names benchmarks or evaluation datasets, and
has_metrics is 1 if it reports concrete numeric results (accuracy, F1, BLEU, and so on).

README:
"#;

static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"));

fn indicator(doc: &Value, key: &str) -> f64 {
    match doc.get(key) {
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().map_or(0.0, |v| v.clamp(0.0, 1.0)),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_or(0.0, |v| v.clamp(0.0, 1.0)),
        _ => 0.0,
    }
}

/// Score the model's JSON answer. Answers without a JSON object score zero.
#[must_use]
pub fn parse_claims(answer: &str) -> f64 {
    let Some(doc) = JSON_OBJECT
        .find(answer)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
    else {
        return 0.0;
    };

    (BENCHMARKS_WEIGHT * indicator(&doc, "mentions_benchmarks") + METRICS_WEIGHT * indicator(&doc, "has_metrics")).clamp(0.0, 1.0)
}

pub(super) async fn evaluate(ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
    if ctx.snapshot.is_none() {
        return Err(EvaluatorError::MissingSnapshot);
    }

    let Some(readme) = ctx.readme.filter(|r| !r.trim().is_empty()) else {
        return Ok(Score::Value(0.0));
    };

    let prompt = format!("{CLAIMS_PROMPT}{}", truncate_readme(readme));
    let answer = ctx.llm.chat(&prompt).await.map_err(EvaluatorError::ServiceUnavailable)?;

    Ok(Score::Value(parse_claims(&answer)))
}
