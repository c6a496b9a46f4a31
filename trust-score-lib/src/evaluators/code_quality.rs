use super::evaluator::{EvalContext, EvaluatorError, Score};
use crate::snapshot::CodeQualityStats;

const LINT_WEIGHT: f64 = 0.6;
const TESTS_WEIGHT: f64 = 0.4;

/// Combine the lint score with the presence of tests.
#[must_use]
pub fn code_quality_score(stats: &CodeQualityStats) -> f64 {
    let tests = if stats.has_tests { 1.0 } else { 0.0 };
    (LINT_WEIGHT * stats.lint_score() + TESTS_WEIGHT * tests).clamp(0.0, 1.0)
}

pub(super) async fn evaluate(ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
    let reader = ctx.reader()?;
    let stats = ctx.on_pool(move || reader.analyze_code_quality()).await?;
    Ok(Score::Value(code_quality_score(&stats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(lint_errors: usize, has_tests: bool) -> CodeQualityStats {
        CodeQualityStats {
            files_checked: 3,
            lint_errors,
            has_tests,
        }
    }

    #[test]
    fn test_clean_code_with_tests() {
        assert!((code_quality_score(&stats(0, true)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clean_code_without_tests() {
        assert!((code_quality_score(&stats(0, false)) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_lint_errors_reduce_score() {
        // 10 errors => lint score 0.5
        assert!((code_quality_score(&stats(10, true)) - 0.7).abs() < 1e-9);

        // lint score bottoms out at 0
        assert!((code_quality_score(&stats(500, true)) - 0.4).abs() < 1e-9);
        assert!(code_quality_score(&stats(500, false)).abs() < 1e-9);
    }
}
