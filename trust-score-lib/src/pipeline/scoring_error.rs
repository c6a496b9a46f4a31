use core::fmt;
use core::time::Duration;
use ohno::AppError;

/// Why an entry could not be rated.
#[derive(Debug)]
pub enum ScoringError {
    /// The entry has no model URL.
    MissingModelUrl,

    /// Rating did not finish within the time budget. No partial rating is produced.
    Timeout { budget: Duration },

    /// An unexpected failure in the pipeline itself.
    Internal(AppError),
}

impl ScoringError {
    /// A stable, machine-checkable identifier for the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingModelUrl => "missing_model_url",
            Self::Timeout { .. } => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingModelUrl => write!(f, "artifact data must include 'model_link'"),
            Self::Timeout { budget } => write!(f, "rating did not finish within {budget:?}"),
            Self::Internal(e) => write!(f, "internal error: {e}"),
        }
    }
}

impl core::error::Error for ScoringError {}

impl From<AppError> for ScoringError {
    fn from(e: AppError) -> Self {
        Self::Internal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohno::app_err;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ScoringError::MissingModelUrl.code(), "missing_model_url");
        assert_eq!(
            ScoringError::Timeout {
                budget: Duration::from_secs(1)
            }
            .code(),
            "timeout"
        );
        assert_eq!(ScoringError::from(app_err!("boom")).code(), "internal");
    }

    #[test]
    fn test_display() {
        assert_eq!(ScoringError::MissingModelUrl.to_string(), "artifact data must include 'model_link'");

        let timeout = ScoringError::Timeout {
            budget: Duration::from_secs(90),
        };
        assert_eq!(timeout.to_string(), "rating did not finish within 90s");
    }
}
