pub(crate) mod hopcroft;

mod refinement;
pub use refinement::Refinement;

use crate::automaton::DFA;

impl DFA {
    /// Minimizes `self` using Hopcroft's partition refinement algorithm. The result is the unique
    /// minimal automaton for the accepted language (up to the implicit sink): unreachable states
    /// and states from which no accepting state is reachable are removed and the remaining states
    /// are numbered in breadth first order. Two equivalent automata over the same ordered alphabet
    /// therefore minimize to equal automata.
    pub fn minimize(&self) -> DFA {
        hopcroft::minimize(self)
    }

    /// Computes the Myhill-Nerode classes of the states of `self` by Moore-style refinement, and
    /// records a distinguishing suffix for every split, see [`Refinement`].
    pub fn refine_with_separators(&self) -> Refinement {
        refinement::refine(self)
    }
}
