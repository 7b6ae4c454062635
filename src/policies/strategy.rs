use std::fmt;

/// Decision taken by a [`FailureEvaluator`](crate::FailureEvaluator) after a consumer failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FailureStrategy {
    /// Stop consuming and ask the host to shut down.
    #[default]
    Default,
    /// Recreate the source scope and resume consumption.
    RestartConsumer,
}

impl FailureStrategy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailureStrategy::Default => "default",
            FailureStrategy::RestartConsumer => "restart_consumer",
        }
    }
}

impl fmt::Display for FailureStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
