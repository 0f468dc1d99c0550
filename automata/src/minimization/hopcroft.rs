use std::collections::VecDeque;

use bit_set::BitSet;
use tracing::trace;

use crate::{
    automaton::{StateIndex, DFA},
    math::Partition,
};

/// The blocks of a partition stored in an arena, together with the index of the block every
/// state currently belongs to.
struct Blocks {
    blocks: Vec<Vec<StateIndex>>,
    class_of: Vec<usize>,
}

impl Blocks {
    fn new(size: usize, initial: impl IntoIterator<Item = Vec<StateIndex>>) -> Self {
        let mut out = Self {
            blocks: vec![],
            class_of: vec![0; size],
        };
        for block in initial.into_iter().filter(|b| !b.is_empty()) {
            let id = out.blocks.len();
            for &q in &block {
                out.class_of[q] = id;
            }
            out.blocks.push(block);
        }
        out
    }

    /// Splits `block` into the states contained in `marked` and the remaining ones. The marked
    /// states keep the old block index, the others move to a new block whose index is returned.
    /// Nothing happens if one of the parts would be empty.
    fn split(&mut self, block: usize, marked: &BitSet) -> Option<usize> {
        let (inside, outside): (Vec<_>, Vec<_>) = self.blocks[block]
            .iter()
            .copied()
            .partition(|q| marked.contains(*q));
        if inside.is_empty() || outside.is_empty() {
            return None;
        }
        let id = self.blocks.len();
        for &q in &outside {
            self.class_of[q] = id;
        }
        self.blocks[block] = inside;
        self.blocks.push(outside);
        Some(id)
    }
}

/// Computes the coarsest partition of the states of the complete automaton `dfa` that is
/// consistent with acceptance and the transitions.
pub(crate) fn partition(dfa: &DFA) -> Partition<StateIndex> {
    let size = dfa.size();
    let alphabet = dfa.alphabet().clone();

    // predecessors[sym][q] holds all states p with p --sym--> q
    let mut predecessors = vec![vec![vec![]; size]; alphabet.size()];
    for p in dfa.state_indices() {
        for (i, sym) in alphabet.universe().enumerate() {
            if let Some(q) = dfa.successor(p, sym) {
                predecessors[i][q].push(p);
            }
        }
    }

    let (accepting, rejecting): (Vec<_>, Vec<_>) =
        dfa.state_indices().partition(|q| dfa.is_accepting(*q));
    let mut blocks = Blocks::new(size, [accepting, rejecting]);

    let mut queue: VecDeque<usize> = (0..blocks.blocks.len()).collect();
    let mut queued = BitSet::with_capacity(size);
    queued.extend(0..blocks.blocks.len());

    while let Some(splitter) = queue.pop_front() {
        queued.remove(splitter);
        let splitter_states = blocks.blocks[splitter].clone();

        for i in 0..alphabet.size() {
            let mut marked = BitSet::with_capacity(size);
            for &q in &splitter_states {
                marked.extend(predecessors[i][q].iter().copied());
            }
            if marked.is_empty() {
                continue;
            }

            let mut touched: Vec<usize> = marked.iter().map(|p| blocks.class_of[p]).collect();
            touched.sort_unstable();
            touched.dedup();

            for block in touched {
                let Some(new) = blocks.split(block, &marked) else {
                    continue;
                };
                if queued.contains(block) {
                    queue.push_back(new);
                    queued.insert(new);
                } else {
                    let smaller = if blocks.blocks[new].len() < blocks.blocks[block].len() {
                        new
                    } else {
                        block
                    };
                    queue.push_back(smaller);
                    queued.insert(smaller);
                }
            }
        }
    }

    Partition::new(blocks.blocks)
}

pub(crate) fn minimize(dfa: &DFA) -> DFA {
    let complete = dfa.reachable_part().completed();
    let partition = partition(&complete);
    let class_of = partition.lookup(complete.size());
    trace!(
        "partition refinement reduced {} states to {} classes",
        complete.size(),
        partition.size()
    );

    let mut quotient = DFA::without_states(complete.alphabet().clone());
    for class in &partition {
        let representative = *class.first().expect("classes of a partition are not empty");
        quotient.add_state(complete.is_accepting(representative));
    }
    for (id, class) in partition.iter().enumerate() {
        let representative = *class.first().expect("classes of a partition are not empty");
        for (sym, target) in complete.edges_from(representative) {
            if let Some(target_class) = class_of[target] {
                quotient.add_edge(id, sym, target_class);
            }
        }
    }
    if let Some(initial) = class_of[complete.initial()] {
        quotient.set_initial(initial);
    }
    quotient.trim()
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test_log::test]
    fn dfa_minimization() {
        let dfa = crate::tests::wiki_dfa();
        let minimized = dfa.minimize();
        // the rejecting sink is dropped
        assert_eq!(minimized.size(), 2);
        assert!(minimized.equivalent(&dfa));
        assert_eq!(minimized.minimize().size(), minimized.size());
        assert_eq!(minimized.minimize(), minimized);
    }

    #[test]
    fn minimization_is_canonical() {
        let dfa = crate::tests::contains_ab();
        let mut bloated = dfa.clone();
        // a copy of state 2 reached from state 1
        let copy = bloated.add_state(true);
        bloated.add_edge(copy, 'a', 2);
        bloated.add_edge(copy, 'b', copy);
        bloated.add_edge(1, 'b', copy);
        assert_eq!(bloated.minimize(), dfa.minimize());
        assert_eq!(dfa.minimize().size(), 3);

        let empty = DFA::empty(CharAlphabet::from("ab"));
        assert_eq!(empty.minimize().size(), 1);
        assert!(empty.minimize().is_empty_language());
    }

    #[test]
    #[cfg(feature = "random")]
    fn random_minimization_is_idempotent() {
        fastrand::seed(17);
        for _ in 0..25 {
            let dfa = crate::random::generate_random_dfa_sized(3, 30);
            let minimized = dfa.minimize();
            assert!(minimized.size() <= dfa.size());
            assert!(minimized.equivalent(&dfa));
            assert_eq!(minimized.minimize().size(), minimized.size());
        }
    }
}
