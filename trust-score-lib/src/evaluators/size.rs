use super::evaluator::{EvalContext, EvaluatorError, Score};
use serde::{Deserialize, Serialize};

const RASPBERRY_PI_LIMIT: u64 = 1_000_000;
const JETSON_NANO_LIMIT: u64 = 10_000_000;
const DESKTOP_PC_LIMIT: u64 = 50_000_000;

/// How well an artifact fits on each class of deployment hardware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeScore {
    pub raspberry_pi: f64,
    pub jetson_nano: f64,
    pub desktop_pc: f64,
    pub aws_server: f64,
}

impl SizeScore {
    /// Reported when the repository size is unknown.
    pub const DEFAULT: Self = Self {
        raspberry_pi: 0.0,
        jetson_nano: 0.0,
        desktop_pc: 0.0,
        aws_server: 1.0,
    };

    /// Classify a repository of `bytes` bytes.
    #[must_use]
    pub fn from_bytes(bytes: u64) -> Self {
        let fits = |limit: bool| if limit { 1.0 } else { 0.0 };

        Self {
            raspberry_pi: fits(bytes <= RASPBERRY_PI_LIMIT),
            jetson_nano: fits(bytes <= JETSON_NANO_LIMIT),
            desktop_pc: fits(bytes < DESKTOP_PC_LIMIT),
            aws_server: 1.0,
        }
    }
}

impl Default for SizeScore {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub(super) async fn evaluate(ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
    let reader = ctx.reader()?;
    let bytes = ctx.on_pool(move || reader.repository_size()).await?.map_err(EvaluatorError::Failed)?;
    Ok(Score::Devices(SizeScore::from_bytes(bytes)))
}
