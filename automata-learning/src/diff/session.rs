use std::time::Instant;

use lightbulb_automata::prelude::*;
use tracing::{debug, info};

use crate::{
    active::{
        DfaLearner, EquivalenceOracle, MembershipOracle, QueryCache, SeedAutomaton, SfaLearner,
    },
    DiffConfig, DiffError, LearnerKind, LearningError, OracleError, Statistics,
};

use super::{Difference, DiffOutcome, DiffReport, Endpoint, Role};

type Seed = Box<dyn SeedAutomaton + Send>;
type Fallback = Box<dyn EquivalenceOracle<DFA> + Send>;

/// Everything one thread of the session owns.
struct Side<M> {
    role: Role,
    oracle: M,
    seed: Option<Seed>,
    fallback: Option<Fallback>,
}

enum SideOutcome {
    Learned(DFA),
    Differs(Difference),
}

struct SideReport {
    outcome: SideOutcome,
    rounds: usize,
    statistics: Statistics,
}

impl<M: MembershipOracle<Output = bool>> Side<M> {
    fn new(role: Role, oracle: M) -> Self {
        Self {
            role,
            oracle,
            seed: None,
            fallback: None,
        }
    }

    /// Runs the learner of this side with `endpoint` as equivalence oracle.
    fn run(
        self,
        alphabet: CharAlphabet,
        config: DiffConfig,
        endpoint: Endpoint,
    ) -> Result<SideReport, DiffError> {
        let Side {
            role,
            oracle,
            seed,
            fallback,
        } = self;
        let mut endpoint = endpoint.with_fallback(fallback);
        let oracle = QueryCache::new(oracle);

        let (result, statistics) = match config.kind {
            LearnerKind::Dfa => {
                let mut learner = DfaLearner::new(alphabet, oracle, &mut endpoint)
                    .with_config(config.learner);
                if let Some(seed) = seed.as_deref() {
                    learner = learner.with_seed(seed);
                }
                let result = learner.learn();
                (result, learner.statistics())
            }
            LearnerKind::Sfa => {
                let mut learner = SfaLearner::new(alphabet, oracle, &mut endpoint)
                    .with_config(config.learner);
                if let Some(seed) = seed.as_deref() {
                    learner = learner.with_seed(seed);
                }
                let result = learner.learn().map(|sfa| sfa.to_dfa());
                (result, learner.statistics())
            }
        };
        let statistics = statistics.with("rounds", endpoint.rounds());
        debug!("{role} finished with {statistics}");

        let outcome = match result {
            Ok(dfa) => SideOutcome::Learned(dfa),
            Err(LearningError::Halted) => match endpoint.difference() {
                Some(difference) => SideOutcome::Differs(difference.clone()),
                None => {
                    return Err(DiffError::Protocol(format!(
                        "{role} halted without a confirmed difference"
                    )))
                }
            },
            Err(LearningError::Oracle(OracleError::RoundLimit { rounds })) => {
                return Err(DiffError::RoundLimit { rounds })
            }
            Err(LearningError::Oracle(OracleError::Protocol(message))) => {
                return Err(DiffError::Protocol(message))
            }
            Err(source) => return Err(DiffError::Learner { role, source }),
        };
        Ok(SideReport {
            outcome,
            rounds: endpoint.rounds(),
            statistics,
        })
    }
}

/// A differential learning session between two targets over a common alphabet. Both targets are
/// learned concurrently, each in its own thread, and the session ends as soon as a word is found
/// on which the targets disagree, or when both learners accept their hypotheses.
///
/// ```
/// use lightbulb_automata::prelude::*;
/// use lightbulb_learning::{active::DfaOracle, diff::DiffSession};
///
/// let alphabet = CharAlphabet::from("ab");
/// let leader = DFA::from_words(alphabet.clone(), ["ab"]);
/// let follower = DFA::from_words(alphabet.clone(), ["ab", "b"]);
/// let report = DiffSession::new(
///     alphabet,
///     DfaOracle::new(leader.clone()),
///     DfaOracle::new(follower.clone()),
/// )
/// .with_leader_fallback(DfaOracle::new(leader))
/// .with_follower_fallback(DfaOracle::new(follower))
/// .run()
/// .unwrap();
/// assert_eq!(report.outcome.witness(), Some(&vec!['b']));
/// ```
pub struct DiffSession<L, F> {
    alphabet: CharAlphabet,
    config: DiffConfig,
    leader: Side<L>,
    follower: Side<F>,
}

impl<L, F> DiffSession<L, F>
where
    L: MembershipOracle<Output = bool> + Send,
    F: MembershipOracle<Output = bool> + Send,
{
    /// Creates a session in which the target behind `leader` is compared to the target behind
    /// `follower`.
    pub fn new(alphabet: CharAlphabet, leader: L, follower: F) -> Self {
        Self {
            alphabet,
            config: DiffConfig::default(),
            leader: Side::new(Role::Leader, leader),
            follower: Side::new(Role::Follower, follower),
        }
    }

    /// Replaces the default [`DiffConfig`] of the session.
    pub fn with_config(self, config: DiffConfig) -> Self {
        Self { config, ..self }
    }

    /// Initializes the learner of the leader from `seed`.
    pub fn with_leader_seed<S: SeedAutomaton + Send + 'static>(mut self, seed: S) -> Self {
        self.leader.seed = Some(Box::new(seed));
        self
    }

    /// Initializes the learner of the follower from `seed`.
    pub fn with_follower_seed<S: SeedAutomaton + Send + 'static>(mut self, seed: S) -> Self {
        self.follower.seed = Some(Box::new(seed));
        self
    }

    /// Sets the equivalence oracle the leader consults when a round yields no counterexample for
    /// its hypothesis.
    pub fn with_leader_fallback<E: EquivalenceOracle<DFA> + Send + 'static>(
        mut self,
        fallback: E,
    ) -> Self {
        self.leader.fallback = Some(Box::new(fallback));
        self
    }

    /// Sets the equivalence oracle the follower consults when a round yields no counterexample
    /// for its hypothesis.
    pub fn with_follower_fallback<E: EquivalenceOracle<DFA> + Send + 'static>(
        mut self,
        fallback: E,
    ) -> Self {
        self.follower.fallback = Some(Box::new(fallback));
        self
    }

    /// Runs both learners to completion.
    pub fn run(self) -> Result<DiffReport, DiffError> {
        let start = Instant::now();
        let DiffSession {
            alphabet,
            config,
            leader,
            follower,
        } = self;
        let (leader_endpoint, follower_endpoint) = Endpoint::pair(config);

        let (leader, follower) = std::thread::scope(|scope| {
            let leader_alphabet = alphabet.clone();
            let leader =
                scope.spawn(move || leader.run(leader_alphabet, config, leader_endpoint));
            let follower = scope.spawn(move || follower.run(alphabet, config, follower_endpoint));
            (
                leader
                    .join()
                    .unwrap_or(Err(DiffError::Panicked(Role::Leader))),
                follower
                    .join()
                    .unwrap_or(Err(DiffError::Panicked(Role::Follower))),
            )
        });

        let (leader, follower) = match (leader, follower) {
            (Ok(leader), Ok(follower)) => (leader, follower),
            (Err(l), Err(f)) if l.is_disconnect() && !f.is_disconnect() => return Err(f),
            (Err(e), _) | (_, Err(e)) => return Err(e),
        };

        let rounds = leader.rounds;
        let outcome = match (leader.outcome, follower.outcome) {
            (SideOutcome::Differs(difference), _) | (_, SideOutcome::Differs(difference)) => {
                DiffOutcome::Difference {
                    witness: difference.witness,
                    leader_accepts: difference.leader_accepts,
                    follower_accepts: difference.follower_accepts,
                    rounds,
                }
            }
            (SideOutcome::Learned(leader), SideOutcome::Learned(follower)) => {
                DiffOutcome::Equivalent {
                    leader,
                    follower,
                    rounds,
                }
            }
        };
        info!(
            "differential session finished after {rounds} rounds in {}ms",
            start.elapsed().as_millis()
        );
        Ok(DiffReport {
            outcome,
            leader_statistics: leader.statistics,
            follower_statistics: follower.statistics,
        })
    }
}

impl<L, F> std::fmt::Debug for DiffSession<L, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffSession")
            .field("alphabet", &self.alphabet)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use super::DiffSession;
    use crate::{
        active::{DfaOracle, FnOracle},
        diff::DiffOutcome,
        DiffConfig, DiffError, LearnerConfig, LearnerKind,
    };

    fn contains(alphabet: &CharAlphabet, sym: char) -> DFA {
        let mut dfa = DFA::for_alphabet(alphabet.clone());
        let seen = dfa.add_state(true);
        for a in alphabet.universe() {
            dfa.add_edge(0, a, if a == sym { seen } else { 0 });
            dfa.add_edge(seen, a, seen);
        }
        dfa
    }

    #[test_log::test]
    fn single_word_difference() {
        let alphabet = CharAlphabet::from("abx");
        let leader = contains(&alphabet, 'a');
        let follower = leader.union(&DFA::from_words(alphabet.clone(), ["x"]));

        let report = DiffSession::new(
            alphabet,
            DfaOracle::new(leader.clone()),
            DfaOracle::new(follower.clone()),
        )
        .with_leader_seed(leader.clone())
        .with_follower_seed(follower.clone())
        .with_leader_fallback(DfaOracle::new(leader))
        .with_follower_fallback(DfaOracle::new(follower))
        .run()
        .unwrap();

        match report.outcome {
            DiffOutcome::Difference {
                witness,
                leader_accepts,
                follower_accepts,
                rounds,
            } => {
                assert_eq!(witness, vec!['x']);
                assert!(!leader_accepts);
                assert!(follower_accepts);
                assert!(rounds >= 1);
            }
            other => panic!("expected a difference, got {other:?}"),
        }
        assert!(report.leader_statistics.get("rounds").is_some());
    }

    #[test_log::test]
    fn hypothesis_discrepancy_does_not_terminate() {
        let alphabet = CharAlphabet::from("ab");
        let target = DFA::builder()
            .with_state_colors([false, false, true])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 0),
                (1, 'a', 1),
                (1, 'b', 2),
                (2, 'a', 2),
                (2, 'b', 2),
            ])
            .into_dfa(0);
        // the seed of the leader only accepts "ab", so its first hypothesis differs from the
        // hypothesis of the follower although both targets agree
        let wrong_seed = DFA::from_words(alphabet.clone(), ["ab"]);

        for kind in [LearnerKind::Dfa, LearnerKind::Sfa] {
            let report = DiffSession::new(
                alphabet.clone(),
                DfaOracle::new(target.clone()),
                DfaOracle::new(target.clone()),
            )
            .with_config(DiffConfig::default().with_kind(kind))
            .with_leader_seed(wrong_seed.clone())
            .with_leader_fallback(DfaOracle::new(target.clone()))
            .with_follower_fallback(DfaOracle::new(target.clone()))
            .run()
            .unwrap();

            match report.outcome {
                DiffOutcome::Equivalent {
                    leader, follower, ..
                } => {
                    assert!(leader.equivalent(&target));
                    assert!(follower.equivalent(&target));
                }
                other => panic!("expected equivalence, got {other:?}"),
            }
        }
    }

    #[test]
    fn learner_failure_is_reported() {
        let alphabet = CharAlphabet::from("ab");
        let target = contains(&alphabet, 'a');
        let result = DiffSession::new(
            alphabet,
            DfaOracle::new(target.clone()),
            DfaOracle::new(target.clone()),
        )
        .with_config(
            DiffConfig::default()
                .with_kind(LearnerKind::Dfa)
                .with_learner(LearnerConfig::default().with_max_iterations(0)),
        )
        .run();
        assert!(matches!(result, Err(DiffError::Learner { .. })));
    }

    #[test]
    fn asymmetric_mode_ignores_one_direction() {
        let alphabet = CharAlphabet::from("ab");
        let leader = DFA::from_words(alphabet.clone(), ["a"]);
        let follower = DFA::from_words(alphabet.clone(), ["a", "b"]);
        let report = DiffSession::new(
            alphabet,
            FnOracle::new(|w: &[char]| w == ['a']),
            DfaOracle::new(follower.clone()),
        )
        .with_config(
            DiffConfig::default()
                .with_kind(LearnerKind::Dfa)
                .with_mode(crate::ExposureMode::Asymmetric),
        )
        .with_leader_fallback(DfaOracle::new(leader))
        .with_follower_fallback(DfaOracle::new(follower))
        .run()
        .unwrap();
        assert!(matches!(report.outcome, DiffOutcome::Equivalent { .. }));
    }
}
