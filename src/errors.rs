use thiserror::Error;

#[derive(Debug, Error)]
pub enum BemError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] anyhow::Error),
    #[error("Error identified during assessment calculation: {0}")]
    FailureInCalculation(#[from] BemCoreError),
    #[error("Error while writing assessment output: {0}")]
    ErrorInOutput(OutputError),
}

/// A calculation stage failed. The run stops at that stage.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {error}")]
pub struct BemCoreError {
    stage: &'static str,
    #[source]
    error: anyhow::Error,
}

impl BemCoreError {
    pub(crate) fn new(stage: &'static str, error: anyhow::Error) -> Self {
        Self { stage, error }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct OutputError {
    error: anyhow::Error,
}

impl OutputError {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_name_the_failing_stage() {
        let error: BemError =
            BemCoreError::new("fabric", anyhow!("Window 3 has no orientation")).into();

        assert_eq!(
            error.to_string(),
            "Error identified during assessment calculation: fabric stage failed: Window 3 has no orientation"
        );
    }
}
