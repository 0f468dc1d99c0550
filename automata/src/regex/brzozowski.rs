use std::collections::BTreeMap;

use tracing::trace;

use crate::automaton::{StateIndex, DFA};

use super::Regex;

/// The system of equations `X_i = ⋃_j R[i][j] X_j` that Brzozowski's algebraic method solves.
/// State `n` (one past the last state of the automaton) is the artificial accepting state, so
/// `R[i][n] = ε` for every accepting state `i`.
struct Equations {
    rows: Vec<BTreeMap<StateIndex, Regex>>,
}

impl Equations {
    fn add(&mut self, from: StateIndex, to: StateIndex, regex: Regex) {
        let entry = self.rows[from].remove(&to).unwrap_or(Regex::Empty);
        let combined = entry.alt(regex);
        if combined != Regex::Empty {
            self.rows[from].insert(to, combined);
        }
    }

    /// Eliminates `state` by substituting its equation into all other equations.
    fn eliminate(&mut self, state: StateIndex) {
        let outgoing = std::mem::take(&mut self.rows[state]);
        let mut outgoing: Vec<(StateIndex, Regex)> = outgoing.into_iter().collect();
        let self_loop = outgoing
            .iter()
            .position(|(to, _)| *to == state)
            .map(|pos| outgoing.remove(pos).1)
            .unwrap_or(Regex::Empty)
            .star();

        for from in 0..self.rows.len() {
            if from == state {
                continue;
            }
            let Some(into) = self.rows[from].remove(&state) else {
                continue;
            };
            let prefix = into.concat(self_loop.clone());
            for (to, regex) in &outgoing {
                self.add(from, *to, prefix.clone().concat(regex.clone()));
            }
        }
    }
}

impl DFA {
    /// Converts `self` into an equivalent regular expression. The automaton is trimmed first, so
    /// states are ordered by their breadth first distance from the initial state. They are then
    /// eliminated back to front, i.e. the state that is furthest away from the initial state is
    /// removed first. The result is correct but not necessarily minimal.
    pub fn to_regex(&self) -> Regex {
        let dfa = self.trim();
        if !dfa.state_indices().any(|q| dfa.is_accepting(q)) {
            return Regex::Empty;
        }
        let size = dfa.size();
        let mut equations = Equations {
            rows: vec![BTreeMap::new(); size + 1],
        };
        for q in dfa.state_indices() {
            let mut grouped: BTreeMap<StateIndex, Vec<char>> = BTreeMap::new();
            for (sym, p) in dfa.edges_from(q) {
                grouped.entry(p).or_default().push(sym);
            }
            for (p, symbols) in grouped {
                equations.add(q, p, Regex::class(symbols));
            }
            if dfa.is_accepting(q) {
                equations.add(q, size, Regex::Epsilon);
            }
        }

        let initial = dfa.initial();
        for q in (0..size).rev().filter(|q| *q != initial) {
            equations.eliminate(q);
        }

        let row = std::mem::take(&mut equations.rows[initial]);
        let self_loop = row.get(&initial).cloned().unwrap_or(Regex::Empty).star();
        let tail = row.get(&size).cloned().unwrap_or(Regex::Empty);
        let out = self_loop.concat(tail);
        trace!("converted DFA with {size} states into {out}");
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test_log::test]
    fn regex_synthesis() {
        let dfa = crate::tests::contains_ab();
        let regex = dfa.to_regex();
        let rendered = regex.render(dfa.alphabet());
        assert_eq!(rendered, "b*aa*b.*");

        let wiki = crate::tests::wiki_dfa();
        let rendered = wiki.to_regex().render(wiki.alphabet());
        let compiled = Regex::compile(&rendered, wiki.alphabet()).expect("valid syntax");
        assert!(compiled.equivalent(&wiki));

        assert_eq!(DFA::empty(CharAlphabet::from("ab")).to_regex(), Regex::Empty);
        assert_eq!(
            DFA::from_words(CharAlphabet::from("ab"), [""]).to_regex(),
            Regex::Epsilon
        );
    }

    #[test]
    #[cfg(feature = "random")]
    fn random_regex_round_trip() {
        fastrand::seed(11);
        for _ in 0..25 {
            let dfa = crate::random::generate_random_dfa_sized(2, 5);
            let rendered = dfa.to_regex().render(dfa.alphabet());
            let compiled = Regex::compile(&rendered, dfa.alphabet()).expect("valid syntax");
            assert!(compiled.equivalent(&dfa), "{rendered} differs from\n{dfa:?}");
        }
    }
}
