//! Library for working with finite automata over character alphabets.
//!
//! The central type is [`DFA`], an arena of index-addressed states where every state carries an
//! acceptance flag and an ordered map from symbols to successor states. Missing transitions
//! implicitly lead to a rejecting sink, calling [`DFA::complete`] makes the sink explicit. All other
//! representations convert into this canonical form:
//! - [`NFA`] allows duplicate and ε-arcs and is turned into a [`DFA`] through subset construction,
//! - [`Sfa`] guards its edges with [`Predicate`]s, i.e. explicit finite subsets of the alphabet,
//! - [`MealyMachine`] emits an output string on every transition.
//!
//! On top of this sits the automaton algebra used by the learners: Hopcroft minimization,
//! product constructions (intersection, union, symmetric difference and difference), shortest
//! witness extraction, conversion into regular expressions through Brzozowski's algebraic
//! method and compilation of regular expressions back into automata. Automata can be written to
//! and read from a line based text format (see [`serialization`]) and rendered with graphviz
//! (see [`dot::Dottable`]).
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use lightbulb_automata::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{CharAlphabet, Symbol, Word},
        automaton::{
            Acceptor, MealyMachine, PartitionViolation, Predicate, Sfa, SfaEdge, StateIndex, DFA,
            NFA,
        },
        builder::{DfaBuilder, MealyBuilder},
        dot::Dottable,
        math,
        operations::{Product, ProductState},
        regex::Regex,
        Color, Show,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the crate and
/// do not really fit to the top level.
pub mod math;

/// Module that contains definitions for dealing with alphabets and words.
pub mod alphabet;
pub use alphabet::{CharAlphabet, Symbol, Word};

/// Defines the automaton representations: [`DFA`], [`NFA`], [`Sfa`] and [`MealyMachine`].
#[allow(clippy::upper_case_acronyms)]
pub mod automaton;
pub use automaton::{Acceptor, MealyMachine, Predicate, Sfa, StateIndex, DFA, NFA};

/// Builders for conveniently writing down small automata.
pub mod builder;

/// Product constructions and reachability questions.
pub mod operations;

/// Contains implementations of partition refinement based minimization.
pub mod minimization;

/// Conversion of automata into regular expressions and back.
pub mod regex;

pub mod serialization;

/// Graphviz output.
pub mod dot;

/// Enumeration of all words over an alphabet.
pub mod kleene;

/// Implements the generation of random automata and words.
#[cfg(feature = "random")]
pub mod random;

use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

/// A color is simply a type that can be used as the output of a state or transition, for example
/// the acceptance flag of a DFA state or the output string of a Mealy transition.
pub trait Color: Clone + Eq + Hash + Debug {}

impl<T: Eq + Clone + Hash + Debug> Color for T {}

/// Helper trait which can be used to display states, words and such.
pub trait Show {
    /// Returns a human readable representation of `self`. For a word this is the word in quotes,
    /// for a state index it is the index. This is mainly used for logging and debugging.
    fn show(&self) -> String;
}

impl Show for char {
    fn show(&self) -> String {
        self.escape_debug().to_string()
    }
}

impl Show for [char] {
    fn show(&self) -> String {
        format!("\"{}\"", self.iter().map(Show::show).join(""))
    }
}

impl Show for Vec<char> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl Show for usize {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for str {
    fn show(&self) -> String {
        format!("{self:?}")
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.as_str().show()
    }
}

impl Show for bool {
    fn show(&self) -> String {
        match self {
            true => "+",
            false => "-",
        }
        .to_string()
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

impl<S: Show + ?Sized> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// The six state automaton from the wikipedia article on DFA minimization. It accepts
    /// all words that reach one of the states 2, 3 or 4, which collapse into a single state.
    pub fn wiki_dfa() -> DFA {
        DFA::builder()
            .with_state_colors([false, false, true, true, true, false])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 2),
                (1, 'a', 0),
                (1, 'b', 3),
                (2, 'a', 4),
                (2, 'b', 5),
                (3, 'a', 4),
                (3, 'b', 5),
                (4, 'a', 4),
                (4, 'b', 5),
                (5, 'a', 5),
                (5, 'b', 5),
            ])
            .into_dfa(0)
    }

    /// Accepts all words over `{a, b}` that contain `ab` as a factor.
    pub fn contains_ab() -> DFA {
        DFA::builder()
            .with_state_colors([false, false, true])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 0),
                (1, 'a', 1),
                (1, 'b', 2),
                (2, 'a', 2),
                (2, 'b', 2),
            ])
            .into_dfa(0)
    }

    #[test]
    fn show_words() {
        assert_eq!(vec!['a', 'b'].show(), "\"ab\"");
        assert_eq!(Vec::<char>::new().show(), "\"\"");
        assert_eq!(vec!['\n'].show(), "\"\\n\"");
        assert_eq!((true, false).show(), "(+, -)");
        assert_eq!("x".show(), "\"x\"");
        assert_eq!(String::from("x").show(), "x".show());
    }
}
