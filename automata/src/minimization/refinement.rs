use std::collections::VecDeque;

use bit_set::BitSet;
use itertools::Itertools;
use tracing::trace;

use crate::{
    alphabet::Word,
    automaton::{StateIndex, DFA},
    math::{Map, Partition},
    Show,
};

/// A node of the split tree. Leaves are the current classes, an inner node remembers the suffix
/// that was used to split it.
#[derive(Debug, Clone)]
struct Node {
    states: Vec<StateIndex>,
    parent: Option<usize>,
    separator: Option<usize>,
}

/// The result of [`DFA::refine_with_separators`]. It holds the Myhill-Nerode classes of the
/// (completed) automaton together with a list of separators: distinguishing suffixes such that
/// any two states in different classes disagree on the acceptance of at least one of them. The
/// empty word is always the first separator.
#[derive(Debug, Clone)]
pub struct Refinement {
    automaton: DFA,
    nodes: Vec<Node>,
    leaves: Vec<usize>,
    class_of: Vec<usize>,
    separators: Vec<Word>,
}

impl Refinement {
    /// The completed automaton on which the refinement was computed. If the original automaton
    /// was incomplete, this contains an additional sink state.
    pub fn automaton(&self) -> &DFA {
        &self.automaton
    }

    /// The distinguishing suffixes in the order in which they were discovered.
    pub fn separators(&self) -> &[Word] {
        &self.separators
    }

    /// Returns the number of classes.
    pub fn size(&self) -> usize {
        self.leaves.len()
    }

    /// Returns the classes as a [`Partition`], classes are ordered by their smallest state.
    pub fn partition(&self) -> Partition<StateIndex> {
        Partition::new(self.leaves.iter().map(|leaf| self.nodes[*leaf].states.clone()))
    }

    /// Returns the index of the class that `state` belongs to.
    pub fn class_of(&self, state: StateIndex) -> Option<usize> {
        self.class_of.get(state).copied()
    }

    /// Returns a suffix which distinguishes `left` from `right`. This is the separator that was
    /// recorded at their lowest common ancestor in the split tree, `None` if the states are in the
    /// same class.
    pub fn separator(&self, left: StateIndex, right: StateIndex) -> Option<&Word> {
        let (l, r) = (
            self.leaves[*self.class_of.get(left)?],
            self.leaves[*self.class_of.get(right)?],
        );
        if l == r {
            return None;
        }
        let ancestors: Vec<usize> = self.ancestors(l).collect();
        let lca = self.ancestors(r).find(|node| ancestors.contains(node))?;
        self.nodes[lca].separator.map(|sep| &self.separators[sep])
    }

    fn ancestors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(node), |n| self.nodes[*n].parent)
    }
}

fn accepts_from(dfa: &DFA, state: StateIndex, suffix: &[char]) -> bool {
    dfa.reached_state_index_from(state, suffix)
        .map(|q| dfa.is_accepting(q))
        .unwrap_or(false)
}

pub(crate) fn refine(dfa: &DFA) -> Refinement {
    let automaton = dfa.clone().completed();
    let size = automaton.size();
    let alphabet = automaton.alphabet().clone();

    let mut predecessors: Map<StateIndex, Vec<StateIndex>> = Map::default();
    for p in automaton.state_indices() {
        for (_, q) in automaton.edges_from(p) {
            predecessors.entry(q).or_default().push(p);
        }
    }

    let mut nodes = vec![Node {
        states: automaton.state_indices().collect(),
        parent: None,
        separator: None,
    }];
    let mut separators: Vec<Word> = vec![vec![]];
    let mut leaf_of: Vec<usize> = vec![0; size];

    // splits `node` according to the acceptance of `suffix`, returns false if nothing changed
    let split = |node: usize,
                     suffix: Word,
                     nodes: &mut Vec<Node>,
                     separators: &mut Vec<Word>,
                     leaf_of: &mut Vec<usize>|
     -> bool {
        let (accepting, rejecting): (Vec<_>, Vec<_>) = nodes[node]
            .states
            .iter()
            .copied()
            .partition(|q| accepts_from(&automaton, *q, &suffix));
        if accepting.is_empty() || rejecting.is_empty() {
            return false;
        }
        let separator = match separators.iter().position(|s| s == &suffix) {
            Some(pos) => pos,
            None => {
                separators.push(suffix);
                separators.len() - 1
            }
        };
        nodes[node].separator = Some(separator);
        for part in [accepting, rejecting] {
            let id = nodes.len();
            for &q in &part {
                leaf_of[q] = id;
            }
            nodes.push(Node {
                states: part,
                parent: Some(node),
                separator: None,
            });
        }
        true
    };

    split(0, vec![], &mut nodes, &mut separators, &mut leaf_of);

    let mut queue: VecDeque<usize> = leaf_of.iter().copied().unique().collect();
    let mut queued = BitSet::new();
    queued.extend(queue.iter().copied());

    while let Some(leaf) = queue.pop_front() {
        queued.remove(leaf);
        if nodes[leaf].separator.is_some() {
            continue;
        }
        let states = nodes[leaf].states.clone();
        let Some(&first) = states.first() else {
            continue;
        };

        let witness = alphabet.universe().find_map(|sym| {
            let target = automaton.successor(first, sym)?;
            states.iter().find_map(|&q| {
                let other = automaton.successor(q, sym)?;
                (leaf_of[other] != leaf_of[target]).then_some((sym, target, other))
            })
        });
        let Some((sym, target, other)) = witness else {
            continue;
        };

        // the successors are in different leaves, so their lowest common ancestor has a separator
        let ancestors: Vec<usize> =
            std::iter::successors(Some(leaf_of[target]), |n| nodes[*n].parent).collect();
        let lca = std::iter::successors(Some(leaf_of[other]), |n| nodes[*n].parent)
            .find(|n| ancestors.contains(n))
            .and_then(|n| nodes[n].separator)
            .expect("distinct leaves have a separating ancestor");
        let mut suffix = vec![sym];
        suffix.extend(separators[lca].iter().copied());
        trace!("splitting class of {} with {}", first, suffix.show());

        if split(leaf, suffix, &mut nodes, &mut separators, &mut leaf_of) {
            let children = [nodes.len() - 2, nodes.len() - 1];
            let mut affected: Vec<usize> = children.to_vec();
            for &q in &states {
                for &p in predecessors.get(&q).into_iter().flatten() {
                    affected.push(leaf_of[p]);
                }
            }
            for node in affected {
                if queued.insert(node) {
                    queue.push_back(node);
                }
            }
        }
    }

    let mut leaves: Vec<usize> = leaf_of.iter().copied().unique().collect();
    leaves.sort_by_key(|leaf| nodes[*leaf].states.iter().min().copied());
    let mut class_of = vec![0; size];
    for (class, leaf) in leaves.iter().enumerate() {
        for &q in &nodes[*leaf].states {
            class_of[q] = class;
        }
    }

    Refinement {
        automaton,
        nodes,
        leaves,
        class_of,
        separators,
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test_log::test]
    fn refinement_records_separators() {
        let dfa = crate::tests::wiki_dfa();
        let refinement = dfa.refine_with_separators();
        assert_eq!(refinement.size(), 3);
        assert_eq!(
            refinement.partition(),
            math::Partition::new([vec![0, 1], vec![2, 3, 4], vec![5]])
        );
        assert_eq!(refinement.separators()[0], Vec::<char>::new());
        assert_eq!(refinement.separator(0, 1), None);
        assert_eq!(refinement.separator(0, 2), Some(&vec![]));

        let sep = refinement.separator(0, 5).expect("classes differ").clone();
        let accepts = |q: StateIndex| {
            dfa.reached_state_index_from(q, &sep)
                .map(|p| dfa.is_accepting(p))
                .unwrap_or(false)
        };
        assert_ne!(accepts(0), accepts(5));
    }

    #[test]
    fn refinement_of_incomplete_automaton() {
        let dfa = DFA::from_words(CharAlphabet::from("ab"), ["ab"]);
        let refinement = dfa.refine_with_separators();
        // the three prefixes and the sink are pairwise inequivalent
        assert_eq!(refinement.automaton().size(), 4);
        assert_eq!(refinement.size(), 4);
        for left in 0..4 {
            for right in (left + 1)..4 {
                assert!(refinement.separator(left, right).is_some());
            }
        }
    }
}
