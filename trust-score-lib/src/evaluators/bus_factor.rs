use super::evaluator::{EvalContext, EvaluatorError, Score};

pub(super) async fn evaluate(ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
    let reader = ctx.reader()?;
    let since = ctx.now - ctx.commit_window;
    let cap = ctx.max_commits;

    let stats = ctx
        .on_pool(move || reader.analyze_commits(since, cap))
        .await?
        .map_err(EvaluatorError::Failed)?;

    Ok(Score::Value(stats.bus_factor()))
}
