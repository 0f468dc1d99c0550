use lightbulb_automata::{automaton::Arc, prelude::*};
use tracing::{debug, warn};

/// The shape of an automaton that can seed a learner. Arcs may be nondeterministic and an arc
/// without a symbol is an ε-arc.
///
/// Only finite automata are accepted. Objects that need a stack to describe their language, such
/// as the pushdown automata obtained from a grammar, have to be approximated by a finite
/// automaton before they can be used as a seed.
pub trait SeedAutomaton {
    fn seed_size(&self) -> usize;

    fn seed_initial(&self) -> StateIndex;

    fn seed_arcs(&self, state: StateIndex) -> Vec<Arc>;

    fn seed_is_final(&self, state: StateIndex) -> bool;
}

impl SeedAutomaton for DFA {
    fn seed_size(&self) -> usize {
        self.size()
    }

    fn seed_initial(&self) -> StateIndex {
        self.initial()
    }

    fn seed_arcs(&self, state: StateIndex) -> Vec<Arc> {
        self.edges_from(state).map(|(a, q)| (Some(a), q)).collect()
    }

    fn seed_is_final(&self, state: StateIndex) -> bool {
        self.is_accepting(state)
    }
}

impl SeedAutomaton for NFA {
    fn seed_size(&self) -> usize {
        self.size()
    }

    fn seed_initial(&self) -> StateIndex {
        self.initial()
    }

    fn seed_arcs(&self, state: StateIndex) -> Vec<Arc> {
        self.arcs_from(state).collect()
    }

    fn seed_is_final(&self, state: StateIndex) -> bool {
        self.is_accepting(state)
    }
}

impl SeedAutomaton for Sfa {
    fn seed_size(&self) -> usize {
        self.size()
    }

    fn seed_initial(&self) -> StateIndex {
        self.initial()
    }

    fn seed_arcs(&self, state: StateIndex) -> Vec<Arc> {
        self.edges_from(state)
            .iter()
            .flat_map(|e| e.predicate.symbols().map(move |a| (Some(a), e.target)))
            .collect()
    }

    fn seed_is_final(&self, state: StateIndex) -> bool {
        self.is_accepting(state)
    }
}

/// The initial content of an observation table derived from a seed automaton. The seed is
/// determinized and its Myhill-Nerode classes are computed by partition refinement. Every class
/// contributes its minimal access word as access row, the suffixes which were used to split the
/// classes become the experiments.
#[derive(Debug, Clone)]
pub struct FastStart {
    automaton: DFA,
    access: Vec<Word>,
    experiments: Vec<Word>,
}

impl FastStart {
    /// Computes the fast start data for `seed`. Arcs labelled with symbols outside of `alphabet`
    /// are skipped.
    pub fn new<S: SeedAutomaton + ?Sized>(seed: &S, alphabet: &CharAlphabet) -> Self {
        let mut nfa = NFA::for_alphabet(alphabet.clone());
        for q in 0..seed.seed_size() {
            let state = if q == 0 { 0 } else { nfa.add_state(false) };
            nfa.set_accepting(state, seed.seed_is_final(q));
        }
        nfa.set_initial(seed.seed_initial());

        for q in 0..seed.seed_size() {
            for (label, target) in seed.seed_arcs(q) {
                match label {
                    None => nfa.add_epsilon(q, target),
                    Some(sym) if alphabet.contains(sym) => nfa.add_arc(q, sym, target),
                    Some(sym) => warn!("skipping seed arc on {sym:?}, it is not in the alphabet"),
                }
            }
        }

        let refinement = nfa.determinize().refine_with_separators();
        let automaton = refinement.automaton().clone();

        let mut access: Vec<Option<Word>> = vec![None; refinement.size()];
        for (word, state) in automaton.minimal_representatives() {
            if let Some(class) = refinement.class_of(state) {
                if access[class].is_none() {
                    access[class] = Some(word);
                }
            }
        }
        let mut access: Vec<Word> = access.into_iter().flatten().collect();
        access.sort_by(|l, r| l.len().cmp(&r.len()).then_with(|| l.cmp(r)));

        debug!(
            "seed with {} states has {} classes and {} separators",
            seed.seed_size(),
            access.len(),
            refinement.separators().len()
        );

        Self {
            automaton,
            access,
            experiments: refinement.separators().to_vec(),
        }
    }

    /// The determinized and completed seed.
    pub fn automaton(&self) -> &DFA {
        &self.automaton
    }

    /// One access word per class, in length-lexicographic order. The first one is the empty word.
    pub fn access_rows(&self) -> &[Word] {
        &self.access
    }

    /// The distinguishing suffixes, starting with the empty word.
    pub fn experiments(&self) -> &[Word] {
        &self.experiments
    }
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use super::FastStart;

    #[test]
    fn fast_start_from_dfa() {
        let alphabet = CharAlphabet::from("ab");
        let seed = DFA::from_words(alphabet.clone(), ["ab"]);
        let start = FastStart::new(&seed, &alphabet);
        assert_eq!(
            start.access_rows(),
            &[vec![], vec!['a'], vec!['b'], vec!['a', 'b']]
        );
        assert_eq!(start.experiments()[0], Vec::<char>::new());
        assert!(start.automaton().equivalent(&seed));

        // every pair of access rows is separated by some experiment
        let accepts = |word: &[char], exp: &[char]| seed.accepts(&[word, exp].concat());
        for (i, l) in start.access_rows().iter().enumerate() {
            for r in &start.access_rows()[i + 1..] {
                assert!(start
                    .experiments()
                    .iter()
                    .any(|e| accepts(l, e) != accepts(r, e)));
            }
        }
    }

    #[test]
    fn fast_start_from_nfa() {
        let alphabet = CharAlphabet::from("abc");
        let mut nfa = NFA::for_alphabet(alphabet.clone());
        let q = nfa.add_state(true);
        nfa.add_arc(0, 'a', 0);
        nfa.add_arc(0, 'b', 0);
        nfa.add_epsilon(0, q);
        nfa.add_arc(q, 'x', q);
        let start = FastStart::new(&nfa, &alphabet);
        // (a|b)* is accepted, 'c' leads to the sink
        assert_eq!(start.access_rows(), &[vec![], vec!['c']]);
    }
}
