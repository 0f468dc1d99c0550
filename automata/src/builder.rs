use crate::{
    alphabet::CharAlphabet,
    automaton::{MealyMachine, StateIndex, DFA},
    math::Set,
    Show,
};

/// Helper struct for the construction of small [`DFA`]s. It stores a list of edges, a list of
/// state colors (the acceptance flags) and an optional default color.
///
/// # Example
///
/// We want to create a DFA with two states 0 and 1 over the alphabet `['a', 'b']` that accepts
/// the words with an odd number of `b`s.
/// ```
/// use lightbulb_automata::prelude::*;
///
/// let dfa = DFA::builder()
///     .with_state_colors([false, true]) // colors given in the order of the states
///     .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
///     .into_dfa(0); // 0 is the initial state
/// assert!(dfa.consume_input("abab"));
/// assert!(!dfa.consume_input("bb"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DfaBuilder {
    symbols: Set<char>,
    alphabet: Option<CharAlphabet>,
    edges: Vec<(StateIndex, char, StateIndex)>,
    default: Option<bool>,
    colors: Vec<(StateIndex, bool)>,
}

impl DfaBuilder {
    /// Sets the default color for states that have no color specified.
    pub fn default_color(mut self, color: bool) -> Self {
        self.default = Some(color);
        self
    }

    /// By default, the only alphabet symbols in the automaton that is built are the ones that
    /// appear on at least one edge, in sorted order. This method can be used to force additional
    /// alphabet symbols to appear.
    pub fn with_alphabet_symbols<I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        self.symbols.extend(symbols);
        self
    }

    /// Fixes the alphabet, including the order of its symbols. Symbols appearing on edges that are
    /// not part of `alphabet` are appended.
    pub fn with_alphabet(mut self, alphabet: CharAlphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    /// Adds a list of colors to `self`. The colors are assigned to the states in the order in which they are given.
    pub fn with_state_colors<I: IntoIterator<Item = bool>>(self, iter: I) -> Self {
        iter.into_iter()
            .enumerate()
            .fold(self, |acc, (i, x)| acc.color(i, x))
    }

    /// Assigns the given `color` to the state with index `idx`.
    pub fn color(mut self, idx: StateIndex, color: bool) -> Self {
        assert!(self.colors.iter().all(|(q, _c)| q != &idx));
        self.colors.push((idx, color));
        self
    }

    /// Adds a list of transitions to `self`. The transitions are added in the order in which they are given.
    pub fn with_edges<I: IntoIterator<Item = (StateIndex, char, StateIndex)>>(
        mut self,
        iter: I,
    ) -> Self {
        self.edges.extend(iter);
        self
    }

    /// Builds the [`DFA`] with the given initial state.
    ///
    /// # Panics
    /// If a state has no color and no default color was set, or if two edges leave the same
    /// state on the same symbol.
    pub fn into_dfa(self, initial: StateIndex) -> DFA {
        let symbols: Set<char> = self
            .edges
            .iter()
            .map(|(_, c, _)| *c)
            .chain(self.symbols)
            .collect();
        let alphabet = match self.alphabet {
            Some(alphabet) => alphabet.union(&CharAlphabet::from_iter(symbols)),
            None => CharAlphabet::from_iter(symbols),
        };

        let num_states = self
            .edges
            .iter()
            .flat_map(|(q, _, p)| [*p + 1, *q + 1])
            .chain(self.colors.iter().map(|(q, _)| *q + 1))
            .chain([initial + 1])
            .max()
            .unwrap_or(1);

        let mut dfa = DFA::without_states(alphabet);
        for i in 0..num_states {
            let color = match self.colors.iter().find(|(q, _)| *q == i) {
                Some((_, c)) => *c,
                None => self.default.unwrap_or_else(|| {
                    panic!(
                        "Default is needed as some states (specifically {}) have no color",
                        i.show()
                    )
                }),
            };
            dfa.add_state(color);
        }
        dfa.set_initial(initial);

        for (q, a, p) in self.edges {
            if let Some(existing) = dfa.add_edge(q, a, p) {
                assert_eq!(
                    existing,
                    p,
                    "state {q} has two different transitions on {}",
                    a.show()
                );
            }
        }
        dfa
    }
}

/// Builder for [`MealyMachine`]s, transitions are given as `(source, symbol, output, target)`.
///
/// ```
/// use lightbulb_automata::prelude::*;
///
/// let mm = MealyMachine::builder()
///     .with_transitions([(0, 'a', "x", 1), (1, 'a', "y", 0)])
///     .into_mealy(0);
/// assert_eq!(mm.transform(&['a', 'a', 'a']), Some("xyx".to_string()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MealyBuilder {
    symbols: Set<char>,
    transitions: Vec<(StateIndex, char, String, StateIndex)>,
}

impl MealyBuilder {
    /// Forces additional symbols into the alphabet.
    pub fn with_alphabet_symbols<I: IntoIterator<Item = char>>(mut self, symbols: I) -> Self {
        self.symbols.extend(symbols);
        self
    }

    /// Adds the given transitions.
    pub fn with_transitions<O, I>(mut self, iter: I) -> Self
    where
        O: Into<String>,
        I: IntoIterator<Item = (StateIndex, char, O, StateIndex)>,
    {
        self.transitions
            .extend(iter.into_iter().map(|(q, a, o, p)| (q, a, o.into(), p)));
        self
    }

    /// Builds the machine with the given initial state.
    pub fn into_mealy(self, initial: StateIndex) -> MealyMachine {
        let alphabet = CharAlphabet::from_iter(
            self.transitions
                .iter()
                .map(|(_, a, _, _)| *a)
                .chain(self.symbols),
        );
        let num_states = self
            .transitions
            .iter()
            .flat_map(|(q, _, _, p)| [*p + 1, *q + 1])
            .chain([initial + 1])
            .max()
            .unwrap_or(1);

        let mut mm = MealyMachine::for_alphabet(alphabet);
        for _ in 1..num_states {
            mm.add_state();
        }
        mm.set_initial(initial);
        for (q, a, o, p) in self.transitions {
            mm.add_transition(q, a, o, p);
        }
        mm
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn builder_alphabet() {
        let dfa = DFA::builder()
            .default_color(false)
            .with_alphabet_symbols(['c'])
            .with_edges([(0, 'b', 1), (1, 'a', 0)])
            .color(1, true)
            .into_dfa(0);
        assert_eq!(dfa.alphabet().symbols(), &['a', 'b', 'c']);
        assert_eq!(dfa.size(), 2);
        assert!(dfa.consume_input("bab"));

        let ordered = DFA::builder()
            .default_color(true)
            .with_alphabet(CharAlphabet::new(['z', 'a']))
            .with_edges([(0, 'a', 0)])
            .into_dfa(0);
        assert_eq!(ordered.alphabet().symbols(), &['z', 'a']);
    }

    #[test]
    #[should_panic]
    fn builder_needs_colors() {
        DFA::builder().with_edges([(0, 'a', 1)]).into_dfa(0);
    }
}
