use std::collections::{BTreeMap, VecDeque};

use itertools::Itertools;

use crate::{alphabet::CharAlphabet, builder::MealyBuilder, math::Set, Show};

use super::StateIndex;

/// A Mealy machine emits an output string on every transition it takes, the output on a word is
/// the concatenation of the outputs along the run. Missing transitions make the output undefined.
#[derive(Clone, PartialEq, Eq)]
pub struct MealyMachine {
    alphabet: CharAlphabet,
    states: Vec<BTreeMap<char, (StateIndex, String)>>,
    initial: StateIndex,
}

impl MealyMachine {
    /// Creates a machine with a single initial state and no transitions.
    pub fn for_alphabet(alphabet: CharAlphabet) -> Self {
        Self {
            alphabet,
            states: vec![BTreeMap::new()],
            initial: 0,
        }
    }

    /// Returns a [`MealyBuilder`].
    pub fn builder() -> MealyBuilder {
        MealyBuilder::default()
    }

    /// The alphabet of the machine.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Sets the initial state.
    pub fn set_initial(&mut self, state: StateIndex) {
        assert!(state < self.states.len(), "state {state} does not exist");
        self.initial = state;
    }

    /// Adds a state and returns its index.
    pub fn add_state(&mut self) -> StateIndex {
        self.states.push(BTreeMap::new());
        self.states.len() - 1
    }

    /// Adds the transition `from --sym/output--> to`, replacing an existing transition on `sym`.
    pub fn add_transition<O: Into<String>>(
        &mut self,
        from: StateIndex,
        sym: char,
        output: O,
        to: StateIndex,
    ) {
        assert!(
            from < self.states.len() && to < self.states.len(),
            "transition from {from} to {to} refers to a state that does not exist"
        );
        self.states[from].insert(sym, (to, output.into()));
    }

    /// Returns target and output of the transition on `sym` leaving `state`.
    pub fn transition(&self, state: StateIndex, sym: char) -> Option<(StateIndex, &str)> {
        self.states
            .get(state)?
            .get(&sym)
            .map(|(q, out)| (*q, out.as_str()))
    }

    /// Runs the machine on `word` from `origin`, returning the reached state and the produced output.
    pub fn run_from(&self, origin: StateIndex, word: &[char]) -> Option<(StateIndex, String)> {
        word.iter()
            .try_fold((origin, String::new()), |(state, mut acc), sym| {
                let (next, out) = self.transition(state, *sym)?;
                acc.push_str(out);
                Some((next, acc))
            })
    }

    /// Returns the state reached by reading `word`.
    pub fn reached_state_index(&self, word: &[char]) -> Option<StateIndex> {
        self.run_from(self.initial, word).map(|(q, _)| q)
    }

    /// Computes the output that is produced when reading `word` from the initial state.
    pub fn transform(&self, word: &[char]) -> Option<String> {
        self.run_from(self.initial, word).map(|(_, out)| out)
    }

    /// Searches for a word on which `self` and `other` produce different output, where one machine
    /// missing a transition the other has also counts as a difference. The returned word is of
    /// minimal length.
    pub fn find_difference(&self, other: &MealyMachine) -> Option<Vec<char>> {
        let alphabet = self.alphabet.union(&other.alphabet);
        let mut seen: Set<(StateIndex, StateIndex)> = Set::default();
        let mut queue = VecDeque::from([(vec![], self.initial, other.initial)]);
        seen.insert((self.initial, other.initial));

        while let Some((word, l, r)) = queue.pop_front() {
            for sym in alphabet.universe() {
                match (self.transition(l, sym), other.transition(r, sym)) {
                    (None, None) => continue,
                    (Some((lq, lo)), Some((rq, ro))) if lo == ro => {
                        if seen.insert((lq, rq)) {
                            let mut next = word.clone();
                            next.push(sym);
                            queue.push_back((next, lq, rq));
                        }
                    }
                    _ => {
                        let mut witness = word;
                        witness.push(sym);
                        return Some(witness);
                    }
                }
            }
        }
        None
    }

    /// Returns true if both machines produce the same output on every word.
    pub fn equivalent(&self, other: &MealyMachine) -> bool {
        self.find_difference(other).is_none()
    }
}

impl std::fmt::Debug for MealyMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mealy machine with initial state {}", self.initial)?;
        for (idx, edges) in self.states.iter().enumerate() {
            writeln!(
                f,
                "{idx} | {}",
                edges
                    .iter()
                    .map(|(sym, (q, out))| format!("{}/{} -> {q}", sym.show(), out.show()))
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MealyMachine;

    fn counter() -> MealyMachine {
        MealyMachine::builder()
            .with_transitions([
                (0, 'a', "0", 1),
                (0, 'b', "", 0),
                (1, 'a', "1", 2),
                (1, 'b', "", 1),
                (2, 'a', "2", 0),
                (2, 'b', "!", 2),
            ])
            .into_mealy(0)
    }

    #[test]
    fn mealy_output() {
        let mm = counter();
        assert_eq!(mm.transform(&[]), Some(String::new()));
        assert_eq!(mm.transform(&['a', 'a', 'b', 'a']), Some("01!2".to_string()));
        assert_eq!(mm.transform(&['c']), None);
        assert_eq!(mm.reached_state_index(&['a', 'b']), Some(1));
    }

    #[test]
    fn mealy_difference() {
        let mm = counter();
        assert!(mm.equivalent(&mm.clone()));

        let mut other = mm.clone();
        other.add_transition(2, 'b', "?", 2);
        assert_eq!(mm.find_difference(&other), Some(vec!['a', 'a', 'b']));

        let mut partial = mm.clone();
        partial.states[1].remove(&'b');
        assert_eq!(mm.find_difference(&partial), Some(vec!['a', 'b']));
    }
}
