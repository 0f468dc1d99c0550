use tracing::debug;

use crate::{
    alphabet::{CharAlphabet, Word},
    automaton::DFA,
};

/// Uses a sprout-like algorithm to generate a random [`DFA`]. `symbols` determines the number of
/// distinct symbols in the [`CharAlphabet`]. `probability` determines the probability of a back
/// edge to some state being inserted. The algorithm is as follows:
/// 1. Start with a single state.
/// 2. For each symbol, go through the existing states in order and with probability `probability`
///    add a back edge to that state.
/// 3. If no back edge to some state was added, we insert an edge to a new state.
/// 4. Repeat until all states and symbols have been treated.
///
/// Every state is accepting with probability one half. The result is complete and every state
/// is reachable.
pub fn generate_random_dfa(symbols: usize, probability: f64) -> DFA {
    let alphabet = CharAlphabet::of_size(symbols);
    let mut dfa = DFA::for_alphabet(alphabet.clone());
    dfa.set_accepting(0, fastrand::bool());

    let mut current = 0;
    let mut symbol_position = 0;

    'outer: loop {
        if current >= dfa.size() {
            // we have treated all states, we can exit
            break 'outer;
        }

        if symbol_position >= symbols {
            // we have treated all symbols, go to next state
            symbol_position = 0;
            current += 1;
            continue 'outer;
        }

        let symbol = alphabet[symbol_position];
        symbol_position += 1;

        for target in 0..=current {
            if fastrand::f64() < probability {
                dfa.add_edge(current, symbol, target);
                continue 'outer;
            }
        }

        // no target was found so we create it
        let target = dfa.add_state(fastrand::bool());
        dfa.add_edge(current, symbol, target);
    }

    debug!("generated random DFA with {} states", dfa.size());
    dfa
}

/// Generate a random complete [`DFA`] with `size` states by randomly drawing a target for every
/// state and symbol. Unreachable states are removed, so the result may be smaller than `size`.
pub fn generate_random_dfa_sized(symbols: usize, size: usize) -> DFA {
    assert!(size > 0, "a DFA needs at least one state");
    let alphabet = CharAlphabet::of_size(symbols);
    let mut dfa = DFA::for_alphabet(alphabet.clone());
    dfa.set_accepting(0, fastrand::bool());
    for _ in 1..size {
        dfa.add_state(fastrand::bool());
    }
    for q in 0..size {
        for sym in alphabet.universe() {
            dfa.add_edge(q, sym, fastrand::usize(..size));
        }
    }
    dfa.reachable_part()
}

/// Draws a random word over `alphabet` whose length is uniform in `min_length..=max_length`.
pub fn generate_random_word(alphabet: &CharAlphabet, min_length: usize, max_length: usize) -> Word {
    if alphabet.is_empty() {
        return vec![];
    }
    let length = fastrand::usize(min_length..=max_length.max(min_length));
    (0..length)
        .map(|_| alphabet[fastrand::usize(..alphabet.size())])
        .collect()
}

/// Draws `count` random words, see [`generate_random_word`].
pub fn generate_random_words(
    alphabet: &CharAlphabet,
    min_length: usize,
    max_length: usize,
    count: usize,
) -> Vec<Word> {
    (0..count)
        .map(|_| generate_random_word(alphabet, min_length, max_length))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    use super::*;

    #[test]
    fn random_dfas() {
        fastrand::seed(7);
        for _ in 0..20 {
            let dfa = generate_random_dfa(2, 0.4);
            assert!(dfa.is_complete());
            assert_eq!(dfa.reachable_part().size(), dfa.size());

            let sized = generate_random_dfa_sized(3, 6);
            assert!(sized.size() <= 6);
            assert!(sized.is_complete());
            assert_eq!(sized.minimize().minimize().size(), sized.minimize().size());
        }
    }

    #[test]
    fn random_words() {
        let alphabet = CharAlphabet::of_size(3);
        for word in generate_random_words(&alphabet, 2, 5, 50) {
            assert!((2..=5).contains(&word.len()));
            assert_eq!(alphabet.foreign_symbol(&word), None);
        }
    }
}
