use crossbeam_channel::{Receiver, Sender};
use lightbulb_automata::prelude::*;
use tracing::{debug, trace};

use crate::{
    active::{Equivalence, EquivalenceOracle, Hypothesis, MembershipOracle},
    DiffConfig, OracleError, Statistics,
};

use super::{rcadiff, Role};

/// Signals exchanged at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// The verified witnesses did not expose a difference between the targets.
    Proceed,
    /// The sender found a counterexample for its own hypothesis.
    Refines,
    /// The sender has no counterexample.
    NoRefine,
    /// A difference between the targets was confirmed, the session ends.
    Terminate,
}

/// A confirmed difference between the two targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub witness: Word,
    pub leader_accepts: bool,
    pub follower_accepts: bool,
}

/// The messages of a round, in the order in which they are sent.
#[derive(Debug, Clone)]
pub enum Message {
    /// follower to leader: the current hypothesis of the follower.
    Hypothesis {
        automaton: DFA,
        statistics: Statistics,
    },
    /// leader to follower: witnesses that the follower poses to its target.
    Verify(Vec<Word>),
    /// follower to leader: the answers of the follower's target, in order.
    Answers(Vec<bool>),
    /// leader to follower: whether the witnesses exposed a difference.
    Verdict {
        control: Control,
        difference: Option<Difference>,
    },
    /// Exchanged in both directions, [`Control::Refines`] or [`Control::NoRefine`].
    Control(Control),
}

/// One side of a differential session. The endpoint serves as equivalence oracle of its learner,
/// every equivalence query plays one or more rounds with the peer.
///
/// The follower sends its hypothesis and answers the witnesses the leader computes from both
/// hypotheses. The leader verifies the witnesses against its own target and tells the follower
/// whether the targets disagree. If not, both sides report whether they found a counterexample
/// for their own hypothesis among the witnesses or with their fallback oracle. A side with a
/// counterexample returns to its learner, a side without one plays the next round with the same
/// hypothesis. When neither side has a counterexample the hypotheses are accepted.
pub struct Endpoint {
    role: Role,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    config: DiffConfig,
    fallback: Option<Box<dyn EquivalenceOracle<DFA> + Send>>,
    rounds: usize,
    difference: Option<Difference>,
    peer_statistics: Statistics,
}

impl Endpoint {
    pub fn new(
        role: Role,
        sender: Sender<Message>,
        receiver: Receiver<Message>,
        config: DiffConfig,
    ) -> Self {
        Self {
            role,
            sender,
            receiver,
            config,
            fallback: None,
            rounds: 0,
            difference: None,
            peer_statistics: Statistics::default(),
        }
    }

    /// Creates the endpoints of both sides, connected through rendezvous channels.
    pub fn pair(config: DiffConfig) -> (Endpoint, Endpoint) {
        let (to_leader, from_follower) = crossbeam_channel::bounded(0);
        let (to_follower, from_leader) = crossbeam_channel::bounded(0);
        (
            Endpoint::new(Role::Leader, to_follower, from_follower, config),
            Endpoint::new(Role::Follower, to_leader, from_leader, config),
        )
    }

    /// Sets the oracle that is asked when the witnesses of a round contain no counterexample for
    /// the own hypothesis.
    pub fn with_fallback(self, fallback: Option<Box<dyn EquivalenceOracle<DFA> + Send>>) -> Self {
        Self { fallback, ..self }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The number of rounds played so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// The confirmed difference, once the session has ended with one.
    pub fn difference(&self) -> Option<&Difference> {
        self.difference.as_ref()
    }

    /// The statistics the follower sent with its last hypothesis, only filled on the leader.
    pub fn peer_statistics(&self) -> &Statistics {
        &self.peer_statistics
    }

    fn send(&self, message: Message) -> Result<(), OracleError> {
        trace!("{} sends {message:?}", self.role);
        self.sender
            .send(message)
            .map_err(|_| OracleError::Disconnected)
    }

    fn receive(&self) -> Result<Message, OracleError> {
        let message = self
            .receiver
            .recv()
            .map_err(|_| OracleError::Disconnected)?;
        trace!("{} received {message:?}", self.role);
        Ok(message)
    }

    fn receive_control(&self) -> Result<Control, OracleError> {
        match self.receive()? {
            Message::Control(control) => Ok(control),
            other => Err(unexpected("control", &other)),
        }
    }

    /// The first witness on which the target disagrees with `hypothesis`, or else a
    /// counterexample of the fallback oracle.
    fn own_counterexample<H: Hypothesis<Output = bool>>(
        &mut self,
        hypothesis: &H,
        automaton: &DFA,
        witnesses: &[Word],
        answers: &[bool],
        oracle: &mut dyn MembershipOracle<Output = bool>,
    ) -> Result<Option<Word>, OracleError> {
        if let Some((word, _)) = witnesses
            .iter()
            .zip(answers)
            .find(|(word, answer)| hypothesis.output(word) != **answer)
        {
            return Ok(Some(word.clone()));
        }
        match self.fallback.as_mut() {
            Some(fallback) => match fallback.check(automaton, oracle)? {
                Equivalence::Counterexample(word) => Ok(Some(word)),
                Equivalence::Correct | Equivalence::Halt => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn follower_round<H: Hypothesis<Output = bool>>(
        &mut self,
        hypothesis: &H,
        automaton: &DFA,
        oracle: &mut dyn MembershipOracle<Output = bool>,
    ) -> Result<Option<Equivalence>, OracleError> {
        self.send(Message::Hypothesis {
            automaton: automaton.clone(),
            statistics: oracle.statistics().with("rounds", self.rounds),
        })?;

        let witnesses = match self.receive()? {
            Message::Verify(witnesses) => witnesses,
            other => return Err(unexpected("witnesses", &other)),
        };
        let answers = witnesses
            .iter()
            .map(|word| oracle.query(word))
            .collect::<Result<Vec<_>, _>>()?;
        self.send(Message::Answers(answers.clone()))?;

        match self.receive()? {
            Message::Verdict {
                control: Control::Terminate,
                difference,
            } => {
                debug!("follower received termination in round {}", self.rounds);
                self.difference = difference;
                return Ok(Some(Equivalence::Halt));
            }
            Message::Verdict { .. } => {}
            other => return Err(unexpected("verdict", &other)),
        }

        let mine = self.own_counterexample(hypothesis, automaton, &witnesses, &answers, oracle)?;
        self.send(Message::Control(control_for(&mine)))?;
        let theirs = self.receive_control()?;
        Ok(conclude(mine, theirs))
    }

    fn leader_round<H: Hypothesis<Output = bool>>(
        &mut self,
        hypothesis: &H,
        automaton: &DFA,
        oracle: &mut dyn MembershipOracle<Output = bool>,
    ) -> Result<Option<Equivalence>, OracleError> {
        let peer = match self.receive()? {
            Message::Hypothesis {
                automaton,
                statistics,
            } => {
                debug!("follower hypothesis has {} states ({statistics})", automaton.size());
                self.peer_statistics = statistics;
                automaton
            }
            other => return Err(unexpected("hypothesis", &other)),
        };

        let witnesses = rcadiff(
            automaton,
            &peer,
            self.config.mode,
            self.config.num_diff,
            self.config.max_depth,
        );
        debug!(
            "round {} verifies {} witnesses: {}",
            self.rounds,
            witnesses.len(),
            witnesses.iter().map(|w| w.show()).collect::<Vec<_>>().join(", ")
        );
        self.send(Message::Verify(witnesses.clone()))?;

        let theirs = match self.receive()? {
            Message::Answers(answers) if answers.len() == witnesses.len() => answers,
            Message::Answers(answers) => {
                return Err(OracleError::Protocol(format!(
                    "expected {} answers but received {}",
                    witnesses.len(),
                    answers.len()
                )))
            }
            other => return Err(unexpected("answers", &other)),
        };
        let answers = witnesses
            .iter()
            .map(|word| oracle.query(word))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(i) = (0..witnesses.len()).find(|&i| answers[i] != theirs[i]) {
            let difference = Difference {
                witness: witnesses[i].clone(),
                leader_accepts: answers[i],
                follower_accepts: theirs[i],
            };
            debug!(
                "confirmed difference on {} in round {}",
                difference.witness.show(),
                self.rounds
            );
            self.send(Message::Verdict {
                control: Control::Terminate,
                difference: Some(difference.clone()),
            })?;
            self.difference = Some(difference);
            return Ok(Some(Equivalence::Halt));
        }
        self.send(Message::Verdict {
            control: Control::Proceed,
            difference: None,
        })?;

        let mine = self.own_counterexample(hypothesis, automaton, &witnesses, &answers, oracle)?;
        let theirs = self.receive_control()?;
        self.send(Message::Control(control_for(&mine)))?;
        Ok(conclude(mine, theirs))
    }
}

fn unexpected(expected: &str, received: &Message) -> OracleError {
    OracleError::Protocol(format!("expected {expected} but received {received:?}"))
}

fn control_for(counterexample: &Option<Word>) -> Control {
    match counterexample {
        Some(_) => Control::Refines,
        None => Control::NoRefine,
    }
}

/// The result of a round without confirmed difference, `None` means another round is played.
fn conclude(mine: Option<Word>, theirs: Control) -> Option<Equivalence> {
    match (mine, theirs) {
        (Some(word), _) => Some(Equivalence::Counterexample(word)),
        (None, Control::NoRefine) => Some(Equivalence::Correct),
        (None, _) => None,
    }
}

impl<H: Hypothesis<Output = bool> + Acceptor> EquivalenceOracle<H> for Endpoint {
    fn check(
        &mut self,
        hypothesis: &H,
        oracle: &mut dyn MembershipOracle<Output = H::Output>,
    ) -> Result<Equivalence, OracleError> {
        let automaton = Acceptor::to_dfa(hypothesis);
        loop {
            if self.rounds >= self.config.max_rounds {
                return Err(OracleError::RoundLimit {
                    rounds: self.rounds,
                });
            }
            self.rounds += 1;
            let result = match self.role {
                Role::Leader => self.leader_round(hypothesis, &automaton, oracle)?,
                Role::Follower => self.follower_round(hypothesis, &automaton, oracle)?,
            };
            if let Some(equivalence) = result {
                return Ok(equivalence);
            }
            trace!("{} has no counterexample, playing another round", self.role);
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("role", &self.role)
            .field("rounds", &self.rounds)
            .field("difference", &self.difference)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use super::{Control, Endpoint, Message};
    use crate::{
        active::{DfaOracle, Equivalence, EquivalenceOracle},
        DiffConfig, OracleError,
    };

    #[test]
    fn follower_reports_disconnect() {
        let (leader, mut follower) = Endpoint::pair(DiffConfig::default());
        drop(leader);
        let dfa = DFA::from_words(CharAlphabet::from("ab"), ["a"]);
        let mut oracle = DfaOracle::new(dfa.clone());
        assert_eq!(
            follower.check(&dfa, &mut oracle),
            Err(OracleError::Disconnected)
        );
    }

    #[test]
    fn round_limit() {
        let (_leader, mut follower) = Endpoint::pair(DiffConfig::default().with_max_rounds(0));
        let dfa = DFA::from_words(CharAlphabet::from("ab"), ["a"]);
        let mut oracle = DfaOracle::new(dfa.clone());
        assert_eq!(
            follower.check(&dfa, &mut oracle),
            Err(OracleError::RoundLimit { rounds: 0 })
        );
    }

    #[test]
    fn leader_rejects_unexpected_messages() {
        let (mut leader, follower) = Endpoint::pair(DiffConfig::default());
        let dfa = DFA::from_words(CharAlphabet::from("ab"), ["a"]);
        std::thread::scope(|scope| {
            scope.spawn(move || follower.send(Message::Control(Control::NoRefine)));
            let mut oracle = DfaOracle::new(dfa.clone());
            let result: Result<Equivalence, _> = leader.check(&dfa, &mut oracle);
            assert!(matches!(result, Err(OracleError::Protocol(_))));
        });
    }
}
