use tracing::warn;

/// Number of iterations after which a learner gives up, unless overridden through the
/// `MAX_ITERATIONS` environment variable.
pub const ITERATION_THRESHOLD: usize = if cfg!(debug_assertions) { 300 } else { 200000 };

/// Settings shared by all learners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnerConfig {
    /// Upper bound on the number of iterations of the learning loop. Every promotion of a row and
    /// every equivalence query counts as one iteration.
    pub max_iterations: usize,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl LearnerConfig {
    /// Reads `MAX_ITERATIONS` from the environment and falls back to [`ITERATION_THRESHOLD`].
    pub fn from_env() -> Self {
        let max_iterations = match std::env::var("MAX_ITERATIONS") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                warn!("ignoring unparsable MAX_ITERATIONS value {value:?}");
                ITERATION_THRESHOLD
            }),
            Err(_) => ITERATION_THRESHOLD,
        };
        Self { max_iterations }
    }

    /// Sets the iteration bound.
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self { max_iterations }
    }
}

/// Determines which states of the product of two hypotheses count as points of exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExposureMode {
    /// The two hypotheses disagree on acceptance.
    #[default]
    Symmetric,
    /// The leader accepts and the follower rejects.
    Asymmetric,
}

/// The learning algorithm that both sides of a differential session run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LearnerKind {
    /// Plain L* with one row per symbol.
    Dfa,
    /// The symbolic learner, suited for large alphabets.
    #[default]
    Sfa,
}

/// Settings of a differential session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffConfig {
    /// Maximal number of witnesses that are verified per round.
    pub num_diff: usize,
    /// Depth bound of the witness search in the product.
    pub max_depth: usize,
    /// Which disagreements are considered.
    pub mode: ExposureMode,
    /// Upper bound on the number of rounds.
    pub max_rounds: usize,
    /// Settings of both learners.
    pub learner: LearnerConfig,
    /// The algorithm both learners run.
    pub kind: LearnerKind,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            num_diff: 5,
            max_depth: 64,
            mode: ExposureMode::default(),
            max_rounds: 256,
            learner: LearnerConfig::default(),
            kind: LearnerKind::default(),
        }
    }
}

impl DiffConfig {
    /// Sets how many witnesses are verified per round.
    pub fn with_num_diff(self, num_diff: usize) -> Self {
        Self { num_diff, ..self }
    }

    /// Sets the depth bound of the witness search.
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    /// Sets which disagreements count as points of exposure.
    pub fn with_mode(self, mode: ExposureMode) -> Self {
        Self { mode, ..self }
    }

    /// Sets the upper bound on the number of rounds.
    pub fn with_max_rounds(self, max_rounds: usize) -> Self {
        Self { max_rounds, ..self }
    }

    /// Sets the configuration shared by both learners.
    pub fn with_learner(self, learner: LearnerConfig) -> Self {
        Self { learner, ..self }
    }

    /// Sets the algorithm both learners run.
    pub fn with_kind(self, kind: LearnerKind) -> Self {
        Self { kind, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_config_setters() {
        let config = DiffConfig::default()
            .with_num_diff(2)
            .with_mode(ExposureMode::Asymmetric)
            .with_kind(LearnerKind::Dfa)
            .with_learner(LearnerConfig::default().with_max_iterations(10));
        assert_eq!(config.num_diff, 2);
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.max_rounds, 256);
        assert_eq!(config.mode, ExposureMode::Asymmetric);
        assert_eq!(config.kind, LearnerKind::Dfa);
        assert_eq!(config.learner.max_iterations, 10);

        let bounded = config.with_max_depth(3).with_max_rounds(7);
        assert_eq!((bounded.max_depth, bounded.max_rounds), (3, 7));
        assert_eq!(bounded.num_diff, 2);
    }
}
