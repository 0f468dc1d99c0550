use std::collections::{BTreeSet, VecDeque};

use itertools::Itertools;
use tracing::trace;

use crate::{alphabet::CharAlphabet, math::Map};

use super::{Acceptor, StateIndex, DFA};

/// An arc of an [`NFA`], labelled with a symbol or with `None` for an ε-arc.
pub type Arc = (Option<char>, StateIndex);

#[derive(Clone, Debug, PartialEq, Eq, Default)]
struct NfaState {
    accepting: bool,
    arcs: Vec<Arc>,
}

/// A nondeterministic finite automaton which may have several arcs with the same label leaving a
/// state as well as ε-arcs. Used for seeds and as the target of regex compilation, it is turned into
/// a [`DFA`] through [`NFA::determinize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NFA {
    alphabet: CharAlphabet,
    states: Vec<NfaState>,
    initial: StateIndex,
}

impl NFA {
    /// Creates an NFA with a single rejecting initial state.
    pub fn for_alphabet(alphabet: CharAlphabet) -> Self {
        Self {
            alphabet,
            states: vec![NfaState::default()],
            initial: 0,
        }
    }

    /// Returns the alphabet.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// The initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Makes `state` initial.
    pub fn set_initial(&mut self, state: StateIndex) {
        assert!(state < self.states.len(), "state {state} does not exist");
        self.initial = state;
    }

    /// Adds a fresh state and returns its index.
    pub fn add_state(&mut self, accepting: bool) -> StateIndex {
        self.states.push(NfaState {
            accepting,
            arcs: vec![],
        });
        self.states.len() - 1
    }

    /// Sets the acceptance flag of `state`.
    pub fn set_accepting(&mut self, state: StateIndex, accepting: bool) {
        self.states[state].accepting = accepting;
    }

    /// Returns whether `state` is accepting.
    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.states.get(state).map(|q| q.accepting).unwrap_or(false)
    }

    /// Adds an arc labelled with `sym`. Duplicate arcs are ignored.
    pub fn add_arc(&mut self, from: StateIndex, sym: char, to: StateIndex) {
        self.push_arc(from, (Some(sym), to))
    }

    /// Adds an ε-arc.
    pub fn add_epsilon(&mut self, from: StateIndex, to: StateIndex) {
        self.push_arc(from, (None, to))
    }

    fn push_arc(&mut self, from: StateIndex, arc: Arc) {
        assert!(
            from < self.states.len() && arc.1 < self.states.len(),
            "arc from {from} to {} refers to a state that does not exist",
            arc.1
        );
        if !self.states[from].arcs.contains(&arc) {
            self.states[from].arcs.push(arc);
        }
    }

    /// Iterates over the arcs leaving `state`.
    pub fn arcs_from(&self, state: StateIndex) -> impl Iterator<Item = Arc> + '_ {
        self.states
            .get(state)
            .into_iter()
            .flat_map(|q| q.arcs.iter().copied())
    }

    /// Computes the set of states reachable from `states` using only ε-arcs.
    pub fn epsilon_closure<I: IntoIterator<Item = StateIndex>>(
        &self,
        states: I,
    ) -> BTreeSet<StateIndex> {
        let mut closure: BTreeSet<_> = states.into_iter().collect();
        let mut stack = closure.iter().copied().collect_vec();
        while let Some(q) = stack.pop() {
            for (label, p) in self.arcs_from(q) {
                if label.is_none() && closure.insert(p) {
                    stack.push(p);
                }
            }
        }
        closure
    }

    /// Computes the ε-closure of all states reachable from `states` by an arc labelled `sym`.
    pub fn step(&self, states: &BTreeSet<StateIndex>, sym: char) -> BTreeSet<StateIndex> {
        self.epsilon_closure(states.iter().flat_map(|&q| {
            self.arcs_from(q)
                .filter_map(move |(label, p)| (label == Some(sym)).then_some(p))
        }))
    }

    /// Subset construction. Only nonempty subsets become states, the empty subset is represented
    /// by the implicit sink of the resulting [`DFA`]. States are numbered in breadth first order,
    /// the initial subset receives index 0.
    pub fn determinize(&self) -> DFA {
        let mut dfa = DFA::without_states(self.alphabet.clone());
        let mut ids: Map<BTreeSet<StateIndex>, StateIndex> = Map::default();
        let mut queue = VecDeque::new();

        let start = self.epsilon_closure([self.initial]);
        let initial = dfa.add_state(start.iter().any(|q| self.is_accepting(*q)));
        dfa.set_initial(initial);
        ids.insert(start.clone(), initial);
        queue.push_back(start);

        while let Some(subset) = queue.pop_front() {
            let source = ids[&subset];
            for sym in self.alphabet.universe() {
                let next = self.step(&subset, sym);
                if next.is_empty() {
                    continue;
                }
                let target = match ids.get(&next) {
                    Some(&id) => id,
                    None => {
                        let id = dfa.add_state(next.iter().any(|q| self.is_accepting(*q)));
                        ids.insert(next.clone(), id);
                        queue.push_back(next);
                        id
                    }
                };
                dfa.add_edge(source, sym, target);
            }
        }
        trace!(
            "determinized NFA with {} states into DFA with {} states",
            self.size(),
            dfa.size()
        );
        dfa
    }
}

impl From<&DFA> for NFA {
    fn from(dfa: &DFA) -> Self {
        let mut nfa = NFA {
            alphabet: dfa.alphabet().clone(),
            states: dfa
                .state_indices()
                .map(|q| NfaState {
                    accepting: dfa.is_accepting(q),
                    arcs: vec![],
                })
                .collect(),
            initial: dfa.initial(),
        };
        for q in dfa.state_indices() {
            for (sym, p) in dfa.edges_from(q) {
                nfa.add_arc(q, sym, p);
            }
        }
        nfa
    }
}

impl Acceptor for NFA {
    fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    fn accepts(&self, word: &[char]) -> bool {
        let mut current = self.epsilon_closure([self.initial]);
        for &sym in word {
            if current.is_empty() {
                return false;
            }
            current = self.step(&current, sym);
        }
        current.into_iter().any(|q| self.is_accepting(q))
    }

    fn size(&self) -> usize {
        self.states.len()
    }

    fn to_dfa(&self) -> DFA {
        self.determinize()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test_log::test]
    fn subset_construction() {
        // words over {a, b} whose second to last symbol is an a
        let mut nfa = NFA::for_alphabet(CharAlphabet::from("ab"));
        let q1 = nfa.add_state(false);
        let q2 = nfa.add_state(true);
        nfa.add_arc(0, 'a', 0);
        nfa.add_arc(0, 'b', 0);
        nfa.add_arc(0, 'a', q1);
        nfa.add_arc(q1, 'a', q2);
        nfa.add_arc(q1, 'b', q2);

        let dfa = nfa.determinize();
        assert_eq!(dfa.size(), 4);
        for word in ["aa", "ab", "bab", "aaa"] {
            assert!(nfa.consume_input(word));
            assert!(dfa.consume_input(word));
        }
        for word in ["", "a", "ba", "abb"] {
            assert!(!nfa.consume_input(word));
            assert!(!dfa.consume_input(word));
        }
    }

    #[test]
    fn epsilon_arcs() {
        let mut nfa = NFA::for_alphabet(CharAlphabet::from("ab"));
        let q1 = nfa.add_state(false);
        let q2 = nfa.add_state(true);
        nfa.add_epsilon(0, q1);
        nfa.add_arc(q1, 'a', q2);
        nfa.add_epsilon(q2, 0);

        assert_eq!(nfa.epsilon_closure([0]).len(), 2);
        let dfa = nfa.determinize();
        assert!(dfa.consume_input("a"));
        assert!(dfa.consume_input("aaa"));
        assert!(!dfa.consume_input(""));
        assert!(!dfa.consume_input("ab"));
        assert_eq!(dfa.successor(dfa.initial(), 'b'), None);
    }
}
