use std::collections::VecDeque;

use lightbulb_automata::prelude::*;
use tracing::trace;

use crate::ExposureMode;

/// Searches the product of `left` and `right` for points of exposure, i.e. states in which the
/// two automata disagree in the way `mode` describes. The product is explored breadth first up to
/// `max_depth` symbols, trying symbols in alphabet order, so the first word reaching a state is
/// its length-lexicographically minimal access word and every state is expanded once. Returns
/// at most `num_diff` of these words for points of exposure, shortest first.
pub fn rcadiff(
    left: &DFA,
    right: &DFA,
    mode: ExposureMode,
    num_diff: usize,
    max_depth: usize,
) -> Vec<Word> {
    let product = Product::new(left, right);
    let exposed = |state: &ProductState| match mode {
        ExposureMode::Symmetric => state.disagrees(),
        ExposureMode::Asymmetric => state.left_accepting && !state.right_accepting,
    };

    let mut best: Vec<Option<Word>> = vec![None; product.size()];
    let mut witnesses: Vec<Word> = vec![];
    let mut queue: VecDeque<usize> = VecDeque::from([0]);
    best[0] = Some(vec![]);
    let mut explored = 0usize;
    while let Some(state) = queue.pop_front() {
        if witnesses.len() >= num_diff {
            break;
        }
        explored += 1;
        let Some(word) = best[state].clone() else {
            continue;
        };
        if exposed(&product.states()[state]) {
            witnesses.push(word.clone());
        }
        if word.len() >= max_depth {
            continue;
        }
        // edges are ordered by symbol
        for (&sym, &target) in &product.states()[state].edges {
            if best[target].is_none() {
                let mut next = word.clone();
                next.push(sym);
                best[target] = Some(next);
                queue.push_back(target);
            }
        }
    }

    trace!(
        "explored {explored} product states, found {} points of exposure",
        witnesses.len()
    );
    witnesses
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use super::rcadiff;
    use crate::ExposureMode;

    #[test]
    fn finds_shortest_witnesses() {
        let alphabet = CharAlphabet::from("ab");
        let left = DFA::from_words(alphabet.clone(), ["a", "bb", "aba"]);
        let right = DFA::from_words(alphabet.clone(), ["bb", "ab"]);

        let witnesses = rcadiff(&left, &right, ExposureMode::Symmetric, 5, 10);
        assert_eq!(witnesses, vec![vec!['a'], vec!['a', 'b'], vec!['a', 'b', 'a']]);
        for word in &witnesses {
            assert_ne!(left.accepts(word), right.accepts(word));
        }

        let asymmetric = rcadiff(&left, &right, ExposureMode::Asymmetric, 5, 10);
        assert_eq!(asymmetric, vec![vec!['a'], vec!['a', 'b', 'a']]);

        assert_eq!(
            rcadiff(&left, &right, ExposureMode::Symmetric, 1, 10),
            vec![vec!['a']]
        );
        assert_eq!(
            rcadiff(&left, &right, ExposureMode::Symmetric, 5, 2),
            vec![vec!['a'], vec!['a', 'b']]
        );
    }

    #[test]
    fn equal_automata_have_no_exposure() {
        let alphabet = CharAlphabet::from("ab");
        let dfa = DFA::from_words(alphabet, ["ab", "b"]);
        assert!(rcadiff(&dfa, &dfa.minimize(), ExposureMode::Symmetric, 5, 10).is_empty());
    }

    #[test]
    #[cfg(feature = "random")]
    fn witnesses_of_random_products() {
        fastrand::seed(29);
        for _ in 0..10 {
            let left = lightbulb_automata::random::generate_random_dfa_sized(3, 300);
            let right = lightbulb_automata::random::generate_random_dfa_sized(3, 300);
            let witnesses = rcadiff(&left, &right, ExposureMode::Symmetric, 5, 64);

            let shortest = left.symmetric_difference(&right).shortest_string();
            assert_eq!(witnesses.is_empty(), shortest.is_none());
            if let Some(shortest) = shortest {
                assert_eq!(witnesses[0].len(), shortest.len());
            }
            assert!(witnesses.len() <= 5);
            assert!(witnesses
                .windows(2)
                .all(|w| (w[0].len(), &w[0]) < (w[1].len(), &w[1])));
            for word in &witnesses {
                assert_ne!(left.accepts(word), right.accepts(word));
            }
        }
    }
}
