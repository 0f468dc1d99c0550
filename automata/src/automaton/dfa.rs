use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{alphabet::CharAlphabet, builder::DfaBuilder, Show};

use super::{Acceptor, StateIndex};

/// A single state of a [`DFA`], consisting of the acceptance flag and an ordered map of outgoing
/// transitions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct DfaState {
    accepting: bool,
    edges: BTreeMap<char, StateIndex>,
}

impl DfaState {
    /// Creates a new state without any outgoing transitions.
    pub fn new(accepting: bool) -> Self {
        Self {
            accepting,
            edges: BTreeMap::new(),
        }
    }

    /// Returns true if the state is accepting.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Iterates over the outgoing transitions in symbol order.
    pub fn edges(&self) -> impl Iterator<Item = (char, StateIndex)> + '_ {
        self.edges.iter().map(|(sym, q)| (*sym, *q))
    }
}

/// A deterministic finite automaton (DFA) accepts a finite word if it reaches an accepting state.
///
/// States are stored in an arena and addressed by their [`StateIndex`]. The transition function
/// may be partial, a missing transition implicitly leads to a rejecting sink state. Exactly one
/// state is initial.
#[derive(Clone, PartialEq, Eq)]
pub struct DFA {
    alphabet: CharAlphabet,
    states: Vec<DfaState>,
    initial: StateIndex,
}

impl DFA {
    /// Creates a new DFA over the given alphabet with a single rejecting state that is initial.
    /// The automaton accepts the empty language.
    pub fn for_alphabet(alphabet: CharAlphabet) -> Self {
        Self {
            alphabet,
            states: vec![DfaState::new(false)],
            initial: 0,
        }
    }

    /// Creates a DFA without any states, it is only valid after a state has been added and made
    /// initial. Mainly used by constructions which build the state space from scratch.
    pub(crate) fn without_states(alphabet: CharAlphabet) -> Self {
        Self {
            alphabet,
            states: vec![],
            initial: 0,
        }
    }

    /// Returns a [`DfaBuilder`] for conveniently writing down small automata.
    pub fn builder() -> DfaBuilder {
        DfaBuilder::default()
    }

    /// Returns a DFA accepting nothing.
    pub fn empty(alphabet: CharAlphabet) -> Self {
        Self::for_alphabet(alphabet)
    }

    /// Returns a DFA accepting every word over `alphabet`.
    pub fn universal(alphabet: CharAlphabet) -> Self {
        let mut dfa = Self::for_alphabet(alphabet);
        dfa.set_accepting(0, true);
        for sym in dfa.alphabet.clone().universe() {
            dfa.add_edge(0, sym, 0);
        }
        dfa
    }

    /// Builds the prefix tree acceptor for the given finite set of words: it accepts precisely the
    /// given words. Symbols which are not part of `alphabet` are added to it.
    pub fn from_words<W, I>(alphabet: CharAlphabet, words: I) -> Self
    where
        W: AsRef<str>,
        I: IntoIterator<Item = W>,
    {
        let mut dfa = Self::for_alphabet(alphabet);
        for word in words {
            let mut state = dfa.initial;
            for sym in word.as_ref().chars() {
                if !dfa.alphabet.contains(sym) {
                    dfa.alphabet = dfa.alphabet.union(&CharAlphabet::new([sym]));
                }
                state = match dfa.successor(state, sym) {
                    Some(q) => q,
                    None => {
                        let q = dfa.add_state(false);
                        dfa.add_edge(state, sym, q);
                        q
                    }
                };
            }
            dfa.set_accepting(state, true);
        }
        dfa
    }

    /// The alphabet over which the automaton reads.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// Replaces the alphabet by the union of the current one with `other`. Transitions on new
    /// symbols are missing and therefore lead to the implicit sink.
    pub fn extend_alphabet(&mut self, other: &CharAlphabet) {
        self.alphabet = self.alphabet.union(other);
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Iterates over all state indices.
    pub fn state_indices(&self) -> std::ops::Range<StateIndex> {
        0..self.states.len()
    }

    /// Gives access to the state with index `state`.
    pub fn state(&self, state: StateIndex) -> Option<&DfaState> {
        self.states.get(state)
    }

    /// Returns the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Makes `state` the initial state.
    pub fn set_initial(&mut self, state: StateIndex) {
        assert!(state < self.states.len(), "state {state} does not exist");
        self.initial = state;
    }

    /// Adds a new state without outgoing transitions and returns its index.
    pub fn add_state(&mut self, accepting: bool) -> StateIndex {
        self.states.push(DfaState::new(accepting));
        self.states.len() - 1
    }

    /// Adds the transition `from --sym--> to`, returning the previous target if a transition on
    /// `sym` already existed.
    pub fn add_edge(&mut self, from: StateIndex, sym: char, to: StateIndex) -> Option<StateIndex> {
        assert!(
            from < self.states.len() && to < self.states.len(),
            "edge {from} --{}--> {to} refers to a state that does not exist",
            sym.show()
        );
        debug_assert!(self.alphabet.contains(sym), "{} is not in the alphabet", sym.show());
        self.states[from].edges.insert(sym, to)
    }

    /// Removes the transition on `sym` from `from` and returns its target.
    pub fn remove_edge(&mut self, from: StateIndex, sym: char) -> Option<StateIndex> {
        self.states.get_mut(from)?.edges.remove(&sym)
    }

    /// Sets the acceptance flag of `state`.
    pub fn set_accepting(&mut self, state: StateIndex, accepting: bool) {
        self.states[state].accepting = accepting;
    }

    /// Returns true if `state` exists and is accepting.
    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.states.get(state).map(|q| q.accepting).unwrap_or(false)
    }

    /// Iterates over the indices of all accepting states.
    pub fn accepting_states(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.accepting.then_some(i))
    }

    /// Returns the successor of `state` on `sym`, `None` stands for the implicit sink.
    pub fn successor(&self, state: StateIndex, sym: char) -> Option<StateIndex> {
        self.states.get(state)?.edges.get(&sym).copied()
    }

    /// Iterates over the outgoing transitions of `state` in symbol order.
    pub fn edges_from(&self, state: StateIndex) -> impl Iterator<Item = (char, StateIndex)> + '_ {
        self.states
            .get(state)
            .into_iter()
            .flat_map(|q| q.edges())
    }

    /// Runs the automaton on `word` from `origin` and returns the reached state, or `None` if the
    /// run falls into the implicit sink.
    pub fn reached_state_index_from(&self, origin: StateIndex, word: &[char]) -> Option<StateIndex> {
        word.iter()
            .try_fold(origin, |state, sym| self.successor(state, *sym))
    }

    /// Runs the automaton on `word` from the initial state.
    pub fn reached_state_index(&self, word: &[char]) -> Option<StateIndex> {
        self.reached_state_index_from(self.initial, word)
    }

    /// Returns true if every state has a transition for every symbol of the alphabet.
    pub fn is_complete(&self) -> bool {
        self.states
            .iter()
            .all(|q| self.alphabet.universe().all(|sym| q.edges.contains_key(&sym)))
    }

    /// Makes the transition function total by adding an explicit rejecting sink that all missing
    /// transitions lead to. Returns the index of the sink if one had to be added.
    #[doc(alias = "fixminimized")]
    pub fn complete(&mut self) -> Option<StateIndex> {
        if self.is_complete() {
            return None;
        }
        let sink = self.add_state(false);
        for state in 0..self.states.len() {
            for sym in self.alphabet.universe() {
                self.states[state].edges.entry(sym).or_insert(sink);
            }
        }
        Some(sink)
    }

    /// Consumes `self` and returns a completed version of it, see [`Self::complete`].
    pub fn completed(mut self) -> Self {
        self.complete();
        self
    }

    /// Returns a copy of `self` with the acceptance of every state flipped. The automaton is
    /// completed first, so the implicit sink becomes an accepting state.
    pub fn complement(&self) -> Self {
        let mut out = self.clone().completed();
        for state in out.states.iter_mut() {
            state.accepting = !state.accepting;
        }
        out
    }
}

impl Acceptor for DFA {
    fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    fn accepts(&self, word: &[char]) -> bool {
        self.reached_state_index(word)
            .map(|q| self.is_accepting(q))
            .unwrap_or(false)
    }

    fn size(&self) -> usize {
        self.states.len()
    }

    fn to_dfa(&self) -> DFA {
        self.clone()
    }
}

impl std::fmt::Debug for DFA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DFA over {} with initial state {}", self.alphabet, self.initial)?;
        for (idx, state) in self.states.iter().enumerate() {
            writeln!(
                f,
                "{}{idx} | {}",
                if state.accepting { "+" } else { " " },
                state
                    .edges()
                    .map(|(sym, q)| format!("{} -> {q}", sym.show()))
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn dfa_runs() {
        let dfa = crate::tests::contains_ab();
        for word in ["ab", "aab", "abb", "bab"] {
            assert!(dfa.consume_input(word), "{word} should be accepted");
        }
        for word in ["", "a", "b", "ba", "bb"] {
            assert!(!dfa.consume_input(word), "{word} should be rejected");
        }
        assert_eq!(dfa.reached_state_index(&['b', 'a']), Some(1));
        assert!(dfa.is_complete());
    }

    #[test]
    fn completion_and_complement() {
        let mut dfa = DFA::from_words(CharAlphabet::from("ab"), ["ab", "b"]);
        assert!(dfa.consume_input("ab"));
        assert!(dfa.consume_input("b"));
        assert!(!dfa.consume_input("a"));
        assert!(!dfa.consume_input("abb"));
        assert!(!dfa.is_complete());

        let complement = dfa.complement();
        assert!(complement.consume_input("a"));
        assert!(complement.consume_input("abb"));
        assert!(!complement.consume_input("ab"));

        let size = dfa.size();
        assert_eq!(dfa.complete(), Some(size));
        assert_eq!(dfa.complete(), None);
        assert!(!dfa.consume_input("abb"));
    }

    #[test]
    fn universal_and_alphabet_extension() {
        let mut dfa = DFA::universal(CharAlphabet::from("ab"));
        assert!(dfa.consume_input("abba"));
        dfa.extend_alphabet(&CharAlphabet::from("c"));
        assert!(!dfa.consume_input("abc"));
        assert!(!dfa.is_complete());
    }
}
