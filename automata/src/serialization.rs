//! Reading and writing automata in a line based text format.
//!
//! Every transition is written on its own line as `src\tdst\t0x<hex>\t0x<hex>`, where the two
//! hexadecimal columns hold the code point of the input and the output symbol (which coincide for
//! acceptors). Every accepting state is written as a line holding just the state id. The source of
//! the first transition line is the initial state, an automaton without transitions has initial
//! state 0.
//!
//! When reading, lines may appear in any order, hexadecimal values are accepted with or without
//! the `0x` prefix and lines of accepting states may carry an additional weight column, which is
//! ignored.
use std::{collections::BTreeMap, fmt::Write as _, path::Path};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    alphabet::CharAlphabet,
    automaton::{StateIndex, DFA},
    math::Map,
};

/// Errors that can occur when reading a serialized automaton.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A line has a number of columns that is neither that of a transition nor of a final state.
    #[error("line {line}: expected 1, 2, 4 or 5 columns but found {found}")]
    FieldCount {
        /// The 1-based line number.
        line: usize,
        /// The number of columns found.
        found: usize,
    },
    /// A state id is not a non-negative integer.
    #[error("line {line}: invalid state id {value:?}")]
    StateId {
        /// The 1-based line number.
        line: usize,
        /// The offending column.
        value: String,
    },
    /// A symbol column is not a hexadecimal code point.
    #[error("line {line}: invalid symbol {value:?}")]
    Symbol {
        /// The 1-based line number.
        line: usize,
        /// The offending column.
        value: String,
    },
    /// Two transitions leave the same state on the same symbol.
    #[error("line {line}: state {state} has two transitions on {symbol:?}")]
    Nondeterministic {
        /// The 1-based line number.
        line: usize,
        /// The state id as written in the input.
        state: usize,
        /// The symbol.
        symbol: char,
    },
    /// Reading or writing failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn parse_state(line: usize, value: &str) -> Result<usize, ParseError> {
    value.parse().map_err(|_| ParseError::StateId {
        line,
        value: value.to_string(),
    })
}

fn parse_symbol(line: usize, value: &str) -> Result<char, ParseError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| ParseError::Symbol {
            line,
            value: value.to_string(),
        })
}

impl DFA {
    /// Serializes the reachable part of `self`. States are renumbered in breadth first order, so
    /// the initial state has id 0 and is the source of the first transition line.
    pub fn to_text(&self) -> String {
        let dfa = self.reachable_part();
        let mut out = String::new();
        for q in dfa.state_indices() {
            for (sym, p) in dfa.edges_from(q) {
                let code = sym as u32;
                let _ = writeln!(out, "{q}\t{p}\t0x{code:x}\t0x{code:x}");
            }
        }
        for q in dfa.accepting_states() {
            let _ = writeln!(out, "{q}");
        }
        out
    }

    /// Writes [`Self::to_text`] to the file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ParseError> {
        std::fs::write(path.as_ref(), self.to_text())?;
        debug!("saved automaton to {}", path.as_ref().display());
        Ok(())
    }

    /// Reads an automaton from its text representation. The alphabet consists of the symbols
    /// appearing on transitions in sorted order. State ids are renumbered densely, the initial
    /// state becomes state 0.
    pub fn from_text(text: &str) -> Result<DFA, ParseError> {
        let mut transitions: Vec<(usize, usize, usize, char)> = vec![];
        let mut finals: Vec<usize> = vec![];

        for (number, line) in text.lines().enumerate() {
            let number = number + 1;
            let columns: Vec<&str> = line.split_whitespace().collect();
            match columns.len() {
                0 => continue,
                1 | 2 => finals.push(parse_state(number, columns[0])?),
                4 | 5 => {
                    let src = parse_state(number, columns[0])?;
                    let dst = parse_state(number, columns[1])?;
                    let input = parse_symbol(number, columns[2])?;
                    let output = parse_symbol(number, columns[3])?;
                    if input != output {
                        warn!("line {number}: ignoring output symbol {output:?} of transition on {input:?}");
                    }
                    transitions.push((number, src, dst, input));
                }
                found => {
                    return Err(ParseError::FieldCount {
                        line: number,
                        found,
                    })
                }
            }
        }

        let initial = transitions.first().map(|(_, src, _, _)| *src).unwrap_or(0);
        let mut ids: BTreeMap<usize, StateIndex> = BTreeMap::from([(initial, 0)]);
        let ordered = transitions
            .iter()
            .flat_map(|(_, src, dst, _)| [*src, *dst])
            .chain(finals.iter().copied());
        for id in ordered {
            let next = ids.len();
            ids.entry(id).or_insert(next);
        }

        let alphabet: CharAlphabet = transitions.iter().map(|(_, _, _, sym)| *sym).collect();
        let mut dfa = DFA::without_states(alphabet);
        for _ in 0..ids.len() {
            dfa.add_state(false);
        }
        dfa.set_initial(0);

        let mut seen: Map<(usize, char), usize> = Map::default();
        for (line, src, dst, sym) in transitions {
            if let Some(existing) = seen.insert((src, sym), dst) {
                if existing != dst {
                    return Err(ParseError::Nondeterministic {
                        line,
                        state: src,
                        symbol: sym,
                    });
                }
            }
            dfa.add_edge(ids[&src], sym, ids[&dst]);
        }
        for id in finals {
            dfa.set_accepting(ids[&id], true);
        }
        Ok(dfa)
    }

    /// Reads an automaton from the file at `path`, see [`Self::from_text`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DFA, ParseError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    use super::ParseError;

    #[test]
    fn text_format() {
        let dfa = crate::tests::contains_ab();
        let text = dfa.to_text();
        assert!(text.starts_with("0\t1\t0x61\t0x61\n0\t0\t0x62\t0x62\n"));
        assert!(text.ends_with("\n2\n"));
        let read = DFA::from_text(&text).unwrap();
        assert_eq!(read, dfa);
    }

    #[test]
    fn lenient_reading() {
        // finals first, ids not dense, initial state 7, prefixless hex and a weight column
        let text = "3 0.5\n\n7\t3\t61\t61\n3\t3\t0x61\t0x61\n7\t7\t0x62\t0x62\n";
        let dfa = DFA::from_text(text).unwrap();
        assert_eq!(dfa.initial(), 0);
        assert!(dfa.consume_input("ba"));
        assert!(dfa.consume_input("aa"));
        assert!(!dfa.consume_input("b"));
        assert!(!dfa.consume_input("ab"));
        assert!(dfa.equivalent(&DFA::from_text(&dfa.to_text()).unwrap()));

        assert!(matches!(
            DFA::from_text("0\t1\t0x61"),
            Err(ParseError::FieldCount { line: 1, found: 3 })
        ));
        assert!(matches!(
            DFA::from_text("0\t1\t0xzz\t0x61"),
            Err(ParseError::Symbol { line: 1, .. })
        ));
        assert!(matches!(
            DFA::from_text("0\t1\t0x61\t0x61\n0\t2\t0x61\t0x61"),
            Err(ParseError::Nondeterministic { line: 2, .. })
        ));
        assert_eq!(DFA::from_text("").unwrap().size(), 1);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiki.txt");
        let dfa = crate::tests::wiki_dfa();
        dfa.save(&path).unwrap();
        let read = DFA::load(&path).unwrap();
        assert!(read.equivalent(&dfa));
        for word in ["", "b", "ab", "aab", "bb"] {
            assert_eq!(read.consume_input(word), dfa.consume_input(word));
        }
    }

    #[test]
    #[cfg(feature = "random")]
    fn random_text_round_trip() {
        fastrand::seed(13);
        for _ in 0..25 {
            let dfa = crate::random::generate_random_dfa_sized(3, 20);
            let read = DFA::from_text(&dfa.to_text()).unwrap();
            assert!(read.equivalent(&dfa));
            assert_eq!(read.size(), dfa.size());
        }
    }
}
