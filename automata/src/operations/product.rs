use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use crate::{
    alphabet::CharAlphabet,
    automaton::{StateIndex, DFA},
    math::Map,
};

/// A state of a [`Product`]. The components are `None` once the respective automaton has fallen
/// into its implicit sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductState {
    /// State of the left automaton.
    pub left: Option<StateIndex>,
    /// State of the right automaton.
    pub right: Option<StateIndex>,
    /// Whether the left component is accepting.
    pub left_accepting: bool,
    /// Whether the right component is accepting.
    pub right_accepting: bool,
    /// Outgoing transitions, indexing into the states of the product.
    pub edges: BTreeMap<char, usize>,
}

impl ProductState {
    /// Returns true if the two components disagree on acceptance.
    pub fn disagrees(&self) -> bool {
        self.left_accepting != self.right_accepting
    }
}

/// The reachable part of the cartesian product of two [`DFA`]s over the union of their alphabets.
/// The initial state has index 0 and states are numbered in breadth first order, the product is
/// complete.
#[derive(Debug, Clone)]
pub struct Product {
    alphabet: CharAlphabet,
    states: Vec<ProductState>,
}

impl Product {
    /// Explores the product of `left` and `right`.
    pub fn new(left: &DFA, right: &DFA) -> Self {
        let alphabet = left.alphabet().union(right.alphabet());
        let mut states: Vec<ProductState> = vec![];
        let mut ids: Map<(Option<StateIndex>, Option<StateIndex>), usize> = Map::default();
        let mut queue = VecDeque::new();

        let mut insert = |pair: (Option<StateIndex>, Option<StateIndex>),
                          states: &mut Vec<ProductState>,
                          queue: &mut VecDeque<usize>| {
            if let Some(&id) = ids.get(&pair) {
                return id;
            }
            let id = states.len();
            states.push(ProductState {
                left: pair.0,
                right: pair.1,
                left_accepting: pair.0.map(|q| left.is_accepting(q)).unwrap_or(false),
                right_accepting: pair.1.map(|q| right.is_accepting(q)).unwrap_or(false),
                edges: BTreeMap::new(),
            });
            ids.insert(pair, id);
            queue.push_back(id);
            id
        };

        insert(
            (Some(left.initial()), Some(right.initial())),
            &mut states,
            &mut queue,
        );
        while let Some(id) = queue.pop_front() {
            let (l, r) = (states[id].left, states[id].right);
            for sym in alphabet.universe() {
                let next = (
                    l.and_then(|q| left.successor(q, sym)),
                    r.and_then(|q| right.successor(q, sym)),
                );
                let target = insert(next, &mut states, &mut queue);
                states[id].edges.insert(sym, target);
            }
        }
        trace!("explored product with {} states", states.len());
        Self { alphabet, states }
    }

    /// The alphabet of the product.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// The states of the product.
    pub fn states(&self) -> &[ProductState] {
        &self.states
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns the successor of product state `state` on `sym`.
    pub fn successor(&self, state: usize, sym: char) -> Option<usize> {
        self.states.get(state)?.edges.get(&sym).copied()
    }

    /// Collects the product into a [`DFA`] where a state is accepting if `combine` applied to the
    /// acceptance of its components returns `true`.
    pub fn collect_dfa<F: Fn(bool, bool) -> bool>(&self, combine: F) -> DFA {
        let mut dfa = DFA::without_states(self.alphabet.clone());
        for state in &self.states {
            dfa.add_state(combine(state.left_accepting, state.right_accepting));
        }
        dfa.set_initial(0);
        for (id, state) in self.states.iter().enumerate() {
            for (&sym, &target) in &state.edges {
                dfa.add_edge(id, sym, target);
            }
        }
        dfa
    }
}

impl DFA {
    /// Builds the product of `self` and `other` where acceptance is determined by applying
    /// `combine` to the acceptance of both components. The result is over the union of both
    /// alphabets and complete.
    pub fn cross_product<F: Fn(bool, bool) -> bool>(&self, other: &DFA, combine: F) -> DFA {
        Product::new(self, other).collect_dfa(combine)
    }

    /// Computes a DFA accepting the intersection of both languages.
    pub fn intersection(&self, other: &DFA) -> DFA {
        self.cross_product(other, |l, r| l && r)
    }

    /// Computes a DFA accepting the union of both languages.
    pub fn union(&self, other: &DFA) -> DFA {
        self.cross_product(other, |l, r| l || r)
    }

    /// Computes a DFA accepting the words accepted by precisely one of the automata.
    pub fn symmetric_difference(&self, other: &DFA) -> DFA {
        self.cross_product(other, |l, r| l ^ r)
    }

    /// Computes a DFA accepting all words accepted by `self` but not by `other`. This is done by
    /// minimizing `other`, complementing it over the union of both alphabets and intersecting the
    /// result with `self`.
    pub fn difference(&self, other: &DFA) -> DFA {
        let mut right = other.minimize();
        right.extend_alphabet(self.alphabet());
        self.intersection(&right.complement())
    }

    /// Returns true if every word accepted by `self` is also accepted by `other`.
    pub fn is_subset_of(&self, other: &DFA) -> bool {
        self.difference(other).shortest_string().is_none()
    }

    /// Checks whether `self` and `other` accept the same language.
    pub fn equivalent(&self, other: &DFA) -> bool {
        self.symmetric_difference(other).is_empty_language()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn ends_with_b() -> DFA {
        DFA::builder()
            .with_state_colors([false, true])
            .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 0), (1, 'b', 1)])
            .into_dfa(0)
    }

    #[test]
    fn boolean_operations() {
        let left = crate::tests::contains_ab();
        let right = ends_with_b();

        let both = left.intersection(&right);
        assert!(both.consume_input("ab"));
        assert!(!both.consume_input("aba"));
        assert!(!both.consume_input("bb"));

        let either = left.union(&right);
        assert!(either.consume_input("aba"));
        assert!(either.consume_input("bb"));
        assert!(!either.consume_input("ba"));

        let xor = left.symmetric_difference(&right);
        assert!(xor.consume_input("aba"));
        assert!(!xor.consume_input("ab"));

        let diff = right.difference(&left);
        assert_eq!(diff.shortest_string(), Some(vec!['b']));
        assert!(!left.is_subset_of(&right));
        assert!(both.is_subset_of(&left));
        assert!(both.is_subset_of(&right));
        assert!(left.equivalent(&left.union(&both)));
    }

    #[test]
    fn difference_over_distinct_alphabets() {
        let ab = DFA::universal(CharAlphabet::from("ab"));
        let abc = DFA::universal(CharAlphabet::from("abc"));
        assert!(ab.is_subset_of(&abc));
        assert!(!abc.is_subset_of(&ab));
        assert_eq!(abc.difference(&ab).shortest_string(), Some(vec!['c']));
    }

    #[test]
    fn product_states() {
        let product = Product::new(&crate::tests::contains_ab(), &ends_with_b());
        assert_eq!(product.states()[0].left, Some(0));
        assert!(product.states().iter().any(|q| q.disagrees()));
        assert_eq!(product.successor(0, 'a'), Some(1));
    }

    #[test]
    #[cfg(feature = "random")]
    fn random_difference_is_empty_iff_subset() {
        fastrand::seed(19);
        for _ in 0..25 {
            let left = crate::random::generate_random_dfa_sized(2, 8);
            let right = crate::random::generate_random_dfa_sized(2, 8);
            for (a, b) in [
                (&left, &right),
                (&left, &left.union(&right)),
                (&left.intersection(&right), &right),
            ] {
                let witness = a.difference(b).shortest_string();
                assert_eq!(witness.is_none(), a.is_subset_of(b));
                if let Some(word) = witness {
                    assert!(a.accepts(&word) && !b.accepts(&word));
                }
            }
            assert!(left.is_subset_of(&left.union(&right)));
        }
    }
}
