//! Differential learning of two targets. Two learners run concurrently, one per target, and
//! synchronize on every equivalence query: the hypotheses are compared, the words on which they
//! disagree are posed to both targets and a word on which the targets themselves disagree ends
//! the session as a confirmed difference.

use lightbulb_automata::prelude::*;

use crate::Statistics;

mod protocol;
pub use protocol::{Control, Difference, Endpoint, Message};

mod rcadiff;
pub use rcadiff::rcadiff;

mod session;
pub use session::DiffSession;

/// The two sides of a session. The leader searches for differences between the hypotheses, the
/// follower only answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Leader,
    Follower,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Leader => write!(f, "leader"),
            Role::Follower => write!(f, "follower"),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// The targets disagree on `witness`.
    Difference {
        witness: Word,
        leader_accepts: bool,
        follower_accepts: bool,
        rounds: usize,
    },
    /// Both learners converged to hypotheses on which no difference could be found.
    Equivalent {
        leader: DFA,
        follower: DFA,
        rounds: usize,
    },
}

impl DiffOutcome {
    /// The number of rounds that were played.
    pub fn rounds(&self) -> usize {
        match self {
            DiffOutcome::Difference { rounds, .. } | DiffOutcome::Equivalent { rounds, .. } => {
                *rounds
            }
        }
    }

    /// The confirmed witness, if the session found one.
    pub fn witness(&self) -> Option<&Word> {
        match self {
            DiffOutcome::Difference { witness, .. } => Some(witness),
            DiffOutcome::Equivalent { .. } => None,
        }
    }
}

/// The result of [`DiffSession::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    pub outcome: DiffOutcome,
    pub leader_statistics: Statistics,
    pub follower_statistics: Statistics,
}

impl std::fmt::Display for DiffReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            DiffOutcome::Difference {
                witness,
                leader_accepts,
                follower_accepts,
                rounds,
            } => writeln!(
                f,
                "difference on {} after {rounds} rounds (leader {}, follower {})",
                witness.show(),
                if *leader_accepts { "accepts" } else { "rejects" },
                if *follower_accepts { "accepts" } else { "rejects" },
            )?,
            DiffOutcome::Equivalent {
                leader,
                follower,
                rounds,
            } => writeln!(
                f,
                "no difference after {rounds} rounds, learned {} and {} states",
                leader.size(),
                follower.size()
            )?,
        }
        writeln!(f, "leader: {}", self.leader_statistics)?;
        write!(f, "follower: {}", self.follower_statistics)
    }
}
