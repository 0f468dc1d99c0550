mod dfa;
pub use dfa::{DfaState, DFA};

mod nfa;
pub use nfa::{Arc, NFA};

mod mealy;
pub use mealy::MealyMachine;

mod sfa;
pub use sfa::{PartitionViolation, Predicate, Sfa, SfaEdge};

use crate::alphabet::CharAlphabet;

/// States of all automata in this crate are addressed by their position in the state arena.
pub type StateIndex = usize;

/// Common interface of everything that decides membership of finite words in a regular language.
/// Every acceptor can be turned into the canonical [`DFA`] representation, which is what all
/// algebraic operations are implemented on.
pub trait Acceptor {
    /// The alphabet over which the acceptor reads.
    fn alphabet(&self) -> &CharAlphabet;

    /// Returns true if and only if `word` is accepted.
    fn accepts(&self, word: &[char]) -> bool;

    /// Returns the number of states.
    fn size(&self) -> usize;

    /// Collects `self` into a [`DFA`] that accepts the same language.
    fn to_dfa(&self) -> DFA;

    /// Runs `self` on the characters of a string, this is a shorthand for [`Self::accepts`].
    fn consume_input(&self, input: &str) -> bool {
        let word: Vec<char> = input.chars().collect();
        self.accepts(&word)
    }
}

impl<A: Acceptor + ?Sized> Acceptor for &A {
    fn alphabet(&self) -> &CharAlphabet {
        A::alphabet(self)
    }

    fn accepts(&self, word: &[char]) -> bool {
        A::accepts(self, word)
    }

    fn size(&self) -> usize {
        A::size(self)
    }

    fn to_dfa(&self) -> DFA {
        A::to_dfa(self)
    }
}
