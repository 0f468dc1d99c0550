use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::{alphabet::CharAlphabet, Show};

use super::{Acceptor, StateIndex, DFA};

/// A predicate guards an edge of an [`Sfa`]. It is represented explicitly as the finite set of
/// symbols for which it holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Predicate(BTreeSet<char>);

impl Predicate {
    /// Creates a predicate that holds for precisely the given symbols.
    pub fn new<I: IntoIterator<Item = char>>(symbols: I) -> Self {
        Self(symbols.into_iter().collect())
    }

    /// The predicate that holds for every symbol of `alphabet`.
    pub fn top(alphabet: &CharAlphabet) -> Self {
        Self::new(alphabet.universe())
    }

    /// Returns true if the predicate holds for `sym`.
    pub fn contains(&self, sym: char) -> bool {
        self.0.contains(&sym)
    }

    /// Returns the number of symbols satisfying the predicate.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the predicate is unsatisfiable.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the satisfying symbols in order.
    pub fn symbols(&self) -> impl DoubleEndedIterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    /// Adds a symbol.
    pub fn insert(&mut self, sym: char) -> bool {
        self.0.insert(sym)
    }

    /// Disjunction of two predicates.
    pub fn union(&self, other: &Predicate) -> Predicate {
        Self(self.0.union(&other.0).copied().collect())
    }

    /// Conjunction of two predicates.
    pub fn intersection(&self, other: &Predicate) -> Predicate {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    /// Returns the symbols of `self` that do not satisfy `other`.
    pub fn difference(&self, other: &Predicate) -> Predicate {
        Self(self.0.difference(&other.0).copied().collect())
    }

    /// Negation relative to `alphabet`.
    pub fn complement(&self, alphabet: &CharAlphabet) -> Predicate {
        Self::new(alphabet.universe().filter(|sym| !self.contains(*sym)))
    }

    /// Returns true if no symbol satisfies both predicates.
    pub fn is_disjoint(&self, other: &Predicate) -> bool {
        self.0.is_disjoint(&other.0)
    }
}

impl FromIterator<char> for Predicate {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl Show for Predicate {
    fn show(&self) -> String {
        match self.0.len() {
            1 => self.symbols().map(|sym| sym.show()).join(""),
            _ => format!("[{}]", self.symbols().map(|sym| sym.show()).join("")),
        }
    }
}

/// An edge of an [`Sfa`]. At most one edge per state is flagged as the sink edge, it covers the
/// symbols for which no explicit observation was made.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SfaEdge {
    /// The guard of the edge.
    pub predicate: Predicate,
    /// The state the edge leads to.
    pub target: StateIndex,
    /// Whether this is the sink edge of its source state.
    pub sink: bool,
}

/// Describes how the edges of a state fail to partition the alphabet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionViolation {
    /// Two edges of `state` are both enabled on `symbol`.
    #[error("two edges of state {state} overlap on {symbol:?}")]
    Overlap {
        /// The offending state.
        state: StateIndex,
        /// A symbol on which two edges are enabled.
        symbol: char,
    },
    /// No edge of `state` is enabled on `symbol`.
    #[error("no edge of state {state} covers {symbol:?}")]
    Uncovered {
        /// The offending state.
        state: StateIndex,
        /// A symbol that is not covered.
        symbol: char,
    },
    /// `state` has more than one sink edge.
    #[error("state {state} has more than one sink edge")]
    MultipleSinks {
        /// The offending state.
        state: StateIndex,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
struct SfaState {
    accepting: bool,
    edges: Vec<SfaEdge>,
}

/// A symbolic finite automaton whose edges are guarded by [`Predicate`]s. In a well formed
/// automaton the guards of the edges leaving a state partition the alphabet, which makes the
/// automaton deterministic and complete, see [`Sfa::check_partition`].
#[derive(Clone, PartialEq, Eq)]
pub struct Sfa {
    alphabet: CharAlphabet,
    states: Vec<SfaState>,
    initial: StateIndex,
}

impl Sfa {
    /// Creates an SFA with a single rejecting initial state without edges.
    pub fn for_alphabet(alphabet: CharAlphabet) -> Self {
        Self {
            alphabet,
            states: vec![SfaState::default()],
            initial: 0,
        }
    }

    /// Returns the alphabet.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// The number of states.
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
    pub fn add_state(&mut self, accepting: bool) -> StateIndex {
        self.states.push(SfaState {
            accepting,
            edges: vec![],
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

    fn push_edge(&mut self, from: StateIndex, predicate: Predicate, to: StateIndex, sink: bool) {
        assert!(
            from < self.states.len() && to < self.states.len(),
            "edge from {from} to {to} refers to a state that does not exist"
        );
        let edges = &mut self.states[from].edges;
        if let Some(edge) = edges.iter_mut().find(|e| e.target == to && e.sink == sink) {
            edge.predicate = edge.predicate.union(&predicate);
        } else {
            edges.push(SfaEdge {
                predicate,
                target: to,
                sink,
            });
        }
    }

    /// Adds an explicit edge. If an explicit edge between the same states exists already, the
    /// predicates are merged.
    pub fn add_edge(&mut self, from: StateIndex, predicate: Predicate, to: StateIndex) {
        self.push_edge(from, predicate, to, false)
    }

    /// Adds the sink edge of `from`.
    pub fn add_sink_edge(&mut self, from: StateIndex, predicate: Predicate, to: StateIndex) {
        self.push_edge(from, predicate, to, true)
    }

    /// The edges leaving `state`.
    pub fn edges_from(&self, state: StateIndex) -> &[SfaEdge] {
        self.states
            .get(state)
            .map(|q| q.edges.as_slice())
            .unwrap_or_default()
    }

    /// The sink edge of `state`, if it has one.
    pub fn sink_edge(&self, state: StateIndex) -> Option<&SfaEdge> {
        self.edges_from(state).iter().find(|e| e.sink)
    }

    /// Returns the target of the first edge of `state` whose guard holds for `sym`.
    pub fn successor(&self, state: StateIndex, sym: char) -> Option<StateIndex> {
        self.edges_from(state)
            .iter()
            .find(|e| e.predicate.contains(sym))
            .map(|e| e.target)
    }

    /// Runs the automaton on `word` and returns the reached state.
    pub fn reached_state_index(&self, word: &[char]) -> Option<StateIndex> {
        word.iter()
            .try_fold(self.initial, |q, sym| self.successor(q, *sym))
    }

    /// Returns the first violation of the partition property, if any. States are checked in order,
    /// for each state symbols are checked in alphabet order.
    pub fn partition_violation(&self) -> Option<PartitionViolation> {
        for (state, q) in self.states.iter().enumerate() {
            if q.edges.iter().filter(|e| e.sink).count() > 1 {
                return Some(PartitionViolation::MultipleSinks { state });
            }
            for symbol in self.alphabet.universe() {
                match q.edges.iter().filter(|e| e.predicate.contains(symbol)).count() {
                    0 => return Some(PartitionViolation::Uncovered { state, symbol }),
                    1 => {}
                    _ => return Some(PartitionViolation::Overlap { state, symbol }),
                }
            }
        }
        None
    }

    /// Verifies that the edges of every state partition the alphabet.
    pub fn check_partition(&self) -> Result<(), PartitionViolation> {
        match self.partition_violation() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Builds an SFA from a [`DFA`]. The DFA is completed first, then for every state the symbols
    /// are grouped by their target. The largest group becomes the sink edge, ties are broken in
    /// favour of the smallest target.
    pub fn from_dfa(dfa: &DFA) -> Self {
        let dfa = dfa.clone().completed();
        let mut sfa = Sfa {
            alphabet: dfa.alphabet().clone(),
            states: dfa
                .state_indices()
                .map(|q| SfaState {
                    accepting: dfa.is_accepting(q),
                    edges: vec![],
                })
                .collect(),
            initial: dfa.initial(),
        };
        for q in dfa.state_indices() {
            let mut groups: BTreeMap<StateIndex, Predicate> = BTreeMap::new();
            for (sym, p) in dfa.edges_from(q) {
                if dfa.alphabet().contains(sym) {
                    groups.entry(p).or_default().insert(sym);
                }
            }
            let sink = groups
                .iter()
                .max_by(|(lt, lp), (rt, rp)| lp.len().cmp(&rp.len()).then(rt.cmp(lt)))
                .map(|(target, _)| *target);
            for (target, predicate) in groups {
                if Some(target) == sink {
                    sfa.add_sink_edge(q, predicate, target);
                } else {
                    sfa.add_edge(q, predicate, target);
                }
            }
        }
        sfa
    }

    /// Computes the equivalent minimal SFA by minimizing the DFA view.
    pub fn minimize(&self) -> Self {
        Self::from_dfa(&self.to_dfa().minimize())
    }
}

impl Acceptor for Sfa {
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
        let mut dfa = DFA::without_states(self.alphabet.clone());
        for q in &self.states {
            dfa.add_state(q.accepting);
        }
        dfa.set_initial(self.initial);
        for state in 0..self.states.len() {
            for sym in self.alphabet.universe() {
                if let Some(target) = self.successor(state, sym) {
                    dfa.add_edge(state, sym, target);
                }
            }
        }
        dfa
    }
}

impl std::fmt::Debug for Sfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SFA over {} with initial state {}", self.alphabet, self.initial)?;
        for (idx, state) in self.states.iter().enumerate() {
            writeln!(
                f,
                "{}{idx} | {}",
                if state.accepting { "+" } else { " " },
                state
                    .edges
                    .iter()
                    .map(|e| format!(
                        "{}{} -> {}",
                        if e.sink { "*" } else { "" },
                        e.predicate.show(),
                        e.target
                    ))
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
    fn sfa_from_dfa() {
        let dfa = crate::tests::contains_ab();
        let sfa = Sfa::from_dfa(&dfa);
        assert_eq!(sfa.check_partition(), Ok(()));
        assert_eq!(sfa.size(), 3);
        // a tie between the groups of state 0 goes to the smaller target
        assert_eq!(sfa.sink_edge(0).map(|e| e.target), Some(0));
        assert_eq!(sfa.sink_edge(2).map(|e| e.predicate.len()), Some(2));
        for word in ["ab", "bab", "", "ba"] {
            assert_eq!(sfa.consume_input(word), dfa.consume_input(word));
        }
        assert!(sfa.to_dfa().equivalent(&dfa));
    }

    #[test]
    fn partition_violations() {
        let alphabet = CharAlphabet::from("abc");
        let mut sfa = Sfa::for_alphabet(alphabet.clone());
        sfa.add_edge(0, Predicate::new(['a']), 0);
        assert_eq!(
            sfa.partition_violation(),
            Some(PartitionViolation::Uncovered {
                state: 0,
                symbol: 'b'
            })
        );
        sfa.add_sink_edge(0, Predicate::new(['a', 'b', 'c']).difference(&Predicate::new(['a'])), 0);
        assert_eq!(sfa.check_partition(), Ok(()));
        let q = sfa.add_state(true);
        sfa.add_edge(0, Predicate::new(['b']), q);
        assert!(matches!(
            sfa.partition_violation(),
            Some(PartitionViolation::Overlap { state: 0, .. })
        ));
    }

    #[test]
    fn predicates() {
        let alphabet = CharAlphabet::from("abcd");
        let p = Predicate::new(['a', 'b']);
        assert_eq!(p.complement(&alphabet), Predicate::new(['c', 'd']));
        assert!(p.is_disjoint(&Predicate::new(['c'])));
        assert_eq!(p.show(), "[ab]");
        assert_eq!(Predicate::new(['x']).show(), "x");
    }
}
