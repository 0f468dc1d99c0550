use lightbulb_automata::{Show, Word};
use thiserror::Error;

use crate::diff::Role;

/// Failures of a membership or equivalence oracle. These are never conflated with a positive
/// answer of an equivalence query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The target system could not be queried, for example because of an I/O failure.
    #[error("target failed to answer: {0}")]
    Target(String),
    /// The peer of a differential session went away.
    #[error("peer disconnected")]
    Disconnected,
    /// The peer of a differential session sent an unexpected message.
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// A differential session exhausted its round budget.
    #[error("round limit of {rounds} reached")]
    RoundLimit {
        /// The number of rounds that were played.
        rounds: usize,
    },
}

/// Errors that abort a learner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LearningError {
    /// An oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// The learner did not find a correct hypothesis within the configured number of iterations.
    #[error("learning did not converge within {iterations} iterations")]
    DidNotConverge {
        /// The iteration limit that was hit.
        iterations: usize,
    },
    /// The membership oracle agrees with the hypothesis on a supposed counterexample.
    #[error("counterexample {} is inconsistent with the hypothesis", .word.show())]
    InconsistentCounterexample {
        /// The offending word.
        word: Word,
    },
    /// A counterexample contains a symbol that is not part of the alphabet.
    #[error("symbol {symbol:?} is not part of the alphabet")]
    ForeignSymbol {
        /// The offending symbol.
        symbol: char,
    },
    /// The equivalence oracle asked the learner to stop.
    #[error("learning was halted by the equivalence oracle")]
    Halted,
}

/// Errors of a differential session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// One of the learners failed.
    #[error("{role} learner failed: {source}")]
    Learner {
        /// The side that failed.
        role: Role,
        /// The failure.
        #[source]
        source: LearningError,
    },
    /// The two sides got out of sync.
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// Neither a difference nor agreement was reached within the round budget.
    #[error("no result after {rounds} rounds")]
    RoundLimit {
        /// The number of rounds that were played.
        rounds: usize,
    },
    /// The thread of a learner panicked.
    #[error("{0} learner panicked")]
    Panicked(Role),
}

impl DiffError {
    /// Returns true if this error only reports that the peer went away. Such errors are a
    /// consequence of a failure on the other side.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            DiffError::Learner {
                source: LearningError::Oracle(OracleError::Disconnected),
                ..
            }
        )
    }
}
