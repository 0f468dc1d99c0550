use std::collections::VecDeque;

use bit_set::BitSet;

use crate::{
    alphabet::Word,
    automaton::{StateIndex, DFA},
    math::{Map, Set},
};

/// Iterator over the minimal representatives of the states of a [`DFA`], that is for every
/// reachable state the length-lexicographically minimal word reaching it. Words are produced in
/// breadth first order, so the first representative is the empty word of the initial state.
pub struct MinimalRepresentatives<'a> {
    dfa: &'a DFA,
    seen: BitSet,
    queue: VecDeque<(Word, StateIndex)>,
}

impl<'a> MinimalRepresentatives<'a> {
    /// Starts the exploration from `origin`.
    pub fn new(dfa: &'a DFA, origin: StateIndex) -> Self {
        let mut seen = BitSet::with_capacity(dfa.size());
        seen.insert(origin);
        Self {
            dfa,
            seen,
            queue: VecDeque::from([(vec![], origin)]),
        }
    }
}

impl Iterator for MinimalRepresentatives<'_> {
    type Item = (Word, StateIndex);

    fn next(&mut self) -> Option<Self::Item> {
        let (word, state) = self.queue.pop_front()?;
        for sym in self.dfa.alphabet().universe() {
            if let Some(target) = self.dfa.successor(state, sym) {
                if self.seen.insert(target) {
                    let mut next = word.clone();
                    next.push(sym);
                    self.queue.push_back((next, target));
                }
            }
        }
        Some((word, state))
    }
}

impl DFA {
    /// Returns an iterator over the minimal representatives of all reachable states, see
    /// [`MinimalRepresentatives`].
    pub fn minimal_representatives(&self) -> MinimalRepresentatives<'_> {
        MinimalRepresentatives::new(self, self.initial())
    }

    /// Performs a breadth first search from the initial state and returns the length-lexicographically
    /// minimal accepted word, or `None` if the accepted language is empty.
    pub fn shortest_string(&self) -> Option<Word> {
        self.minimal_representatives()
            .find_map(|(word, state)| self.is_accepting(state).then_some(word))
    }

    /// Returns true if and only if the accepted language is empty.
    pub fn is_empty_language(&self) -> bool {
        self.shortest_string().is_none()
    }

    /// Iterates over the indices of all states reachable from the initial state in breadth first order.
    pub fn reachable_state_indices(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.minimal_representatives().map(|(_, q)| q)
    }

    /// Restricts the automaton to the states in `keep`, renumbering them in the order given.
    /// Transitions into dropped states are removed.
    fn restrict(&self, keep: &[StateIndex]) -> DFA {
        let renaming: Map<StateIndex, StateIndex> =
            keep.iter().enumerate().map(|(new, old)| (*old, new)).collect();
        let mut out = DFA::without_states(self.alphabet().clone());
        for &old in keep {
            out.add_state(self.is_accepting(old));
        }
        for (new, &old) in keep.iter().enumerate() {
            for (sym, target) in self.edges_from(old) {
                if let Some(&renamed) = renaming.get(&target) {
                    out.add_edge(new, sym, renamed);
                }
            }
        }
        if let Some(&initial) = renaming.get(&self.initial()) {
            out.set_initial(initial);
        }
        out
    }

    /// Returns the reachable part of `self`, states are renumbered in breadth first order so the
    /// initial state receives index 0.
    pub fn reachable_part(&self) -> DFA {
        let keep: Vec<_> = self.reachable_state_indices().collect();
        self.restrict(&keep)
    }

    /// Removes all states that are unreachable or from which no accepting state can be reached.
    /// The initial state is always kept, states are renumbered in breadth first order.
    pub fn trim(&self) -> DFA {
        let reachable: Vec<_> = self.reachable_state_indices().collect();

        let mut predecessors: Map<StateIndex, Vec<StateIndex>> = Map::default();
        for &q in &reachable {
            for (_, p) in self.edges_from(q) {
                predecessors.entry(p).or_default().push(q);
            }
        }
        let mut productive: Set<StateIndex> = reachable
            .iter()
            .copied()
            .filter(|q| self.is_accepting(*q))
            .collect();
        let mut stack: Vec<_> = productive.iter().copied().collect();
        while let Some(q) = stack.pop() {
            for &p in predecessors.get(&q).into_iter().flatten() {
                if productive.insert(p) {
                    stack.push(p);
                }
            }
        }

        let keep: Vec<_> = reachable
            .into_iter()
            .filter(|q| *q == self.initial() || productive.contains(q))
            .collect();
        self.restrict(&keep)
    }

    /// Attempts to separate the state `left` from the state `right` by finding a word that leads
    /// to different acceptance. The returned word is in the symmetric difference of the languages
    /// accepted from the two states and of minimal length.
    pub fn separate(&self, left: StateIndex, right: StateIndex) -> Option<Word> {
        if left == right {
            return None;
        }
        let accepting = |q: Option<StateIndex>| q.map(|q| self.is_accepting(q)).unwrap_or(false);
        let mut seen: Set<(Option<StateIndex>, Option<StateIndex>)> = Set::default();
        let mut queue = VecDeque::from([(vec![], Some(left), Some(right))]);
        seen.insert((Some(left), Some(right)));

        while let Some((word, l, r)) = queue.pop_front() {
            if accepting(l) != accepting(r) {
                return Some(word);
            }
            for sym in self.alphabet().universe() {
                let next = (
                    l.and_then(|q| self.successor(q, sym)),
                    r.and_then(|q| self.successor(q, sym)),
                );
                if next.0 != next.1 && seen.insert(next) {
                    let mut extended = word.clone();
                    extended.push(sym);
                    queue.push_back((extended, next.0, next.1));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn representatives_and_witnesses() {
        let dfa = crate::tests::wiki_dfa();
        let reps: Vec<_> = dfa.minimal_representatives().collect();
        assert_eq!(reps.len(), 6);
        assert_eq!(reps[0], (vec![], 0));
        assert_eq!(reps[2], (vec!['b'], 2));
        assert_eq!(dfa.shortest_string(), Some(vec!['b']));
        assert!(!dfa.is_empty_language());
        assert!(DFA::empty(CharAlphabet::from("ab")).is_empty_language());
    }

    #[test]
    fn trimming() {
        let mut dfa = crate::tests::wiki_dfa();
        let unreachable = dfa.add_state(true);
        dfa.add_edge(unreachable, 'a', 0);
        assert_eq!(dfa.reachable_part().size(), 6);

        // state 5 is a rejecting sink
        let trimmed = dfa.trim();
        assert_eq!(trimmed.size(), 5);
        assert!(trimmed.equivalent(&dfa));
    }

    #[test]
    fn separate_states() {
        let dfa = crate::tests::wiki_dfa();
        assert_eq!(dfa.separate(0, 1), None);
        assert_eq!(dfa.separate(2, 3), None);
        assert_eq!(dfa.separate(0, 2), Some(vec![]));
        assert_eq!(dfa.separate(0, 5), Some(vec!['b']));
    }
}
