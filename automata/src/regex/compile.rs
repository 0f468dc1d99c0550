use regex_syntax::hir::{Class, Hir, HirKind};
use thiserror::Error;
use tracing::debug;

use crate::{
    alphabet::CharAlphabet,
    automaton::{StateIndex, DFA, NFA},
};

use super::Regex;

/// Counted repetitions are expanded into copies of the repeated expression, bounds above this
/// value are rejected.
pub const REPETITION_LIMIT: u32 = 256;

/// Errors that can occur when compiling a regular expression into an automaton.
#[derive(Debug, Error)]
pub enum RegexError {
    /// The pattern is not syntactically valid.
    #[error("invalid regular expression: {0}")]
    Syntax(#[from] Box<regex_syntax::Error>),
    /// The pattern uses a construct that has no finite automaton counterpart here, such as
    /// anchors, word boundaries or very large counted repetitions.
    #[error("unsupported construct in regular expression: {0}")]
    Unsupported(String),
    /// A literal or class does not mention any symbol of the alphabet.
    #[error("{0} does not match any symbol of the alphabet")]
    OutsideAlphabet(String),
}

/// Thompson construction of an [`NFA`] from the high level representation of a pattern.
struct Thompson<'a> {
    alphabet: &'a CharAlphabet,
    nfa: NFA,
}

impl Thompson<'_> {
    fn fragment(&mut self, hir: &Hir) -> Result<(StateIndex, StateIndex), RegexError> {
        match hir.kind() {
            HirKind::Empty => {
                let state = self.nfa.add_state(false);
                Ok((state, state))
            }
            HirKind::Literal(literal) => {
                let text = std::str::from_utf8(&literal.0)
                    .map_err(|_| RegexError::Unsupported("non UTF-8 literal".to_string()))?;
                let start = self.nfa.add_state(false);
                let mut end = start;
                for sym in text.chars() {
                    if !self.alphabet.contains(sym) {
                        return Err(RegexError::OutsideAlphabet(format!("{sym:?}")));
                    }
                    let next = self.nfa.add_state(false);
                    self.nfa.add_arc(end, sym, next);
                    end = next;
                }
                Ok((start, end))
            }
            HirKind::Class(class) => {
                let (symbols, nonempty): (Vec<char>, bool) = match class {
                    Class::Unicode(class) => (
                        self.alphabet
                            .universe()
                            .filter(|sym| {
                                class
                                    .ranges()
                                    .iter()
                                    .any(|r| r.start() <= *sym && *sym <= r.end())
                            })
                            .collect(),
                        !class.ranges().is_empty(),
                    ),
                    Class::Bytes(class) => (
                        self.alphabet
                            .universe()
                            .filter(|sym| {
                                u8::try_from(*sym).is_ok_and(|b| {
                                    class.ranges().iter().any(|r| r.start() <= b && b <= r.end())
                                })
                            })
                            .collect(),
                        !class.ranges().is_empty(),
                    ),
                };
                if nonempty && symbols.is_empty() {
                    return Err(RegexError::OutsideAlphabet(format!("{hir}")));
                }
                let start = self.nfa.add_state(false);
                let end = self.nfa.add_state(false);
                for sym in symbols {
                    self.nfa.add_arc(start, sym, end);
                }
                Ok((start, end))
            }
            HirKind::Look(look) => Err(RegexError::Unsupported(format!("{look:?}"))),
            HirKind::Capture(capture) => self.fragment(&capture.sub),
            HirKind::Concat(parts) => {
                let start = self.nfa.add_state(false);
                let mut end = start;
                for part in parts {
                    let (s, e) = self.fragment(part)?;
                    self.nfa.add_epsilon(end, s);
                    end = e;
                }
                Ok((start, end))
            }
            HirKind::Alternation(parts) => {
                let start = self.nfa.add_state(false);
                let end = self.nfa.add_state(false);
                for part in parts {
                    let (s, e) = self.fragment(part)?;
                    self.nfa.add_epsilon(start, s);
                    self.nfa.add_epsilon(e, end);
                }
                Ok((start, end))
            }
            HirKind::Repetition(repetition) => {
                if repetition.min > REPETITION_LIMIT
                    || repetition.max.is_some_and(|max| max > REPETITION_LIMIT)
                {
                    return Err(RegexError::Unsupported(format!(
                        "repetition bound above {REPETITION_LIMIT}"
                    )));
                }
                let start = self.nfa.add_state(false);
                let mut end = start;
                for _ in 0..repetition.min {
                    let (s, e) = self.fragment(&repetition.sub)?;
                    self.nfa.add_epsilon(end, s);
                    end = e;
                }
                match repetition.max {
                    None => {
                        let (s, e) = self.fragment(&repetition.sub)?;
                        let hub = self.nfa.add_state(false);
                        self.nfa.add_epsilon(end, hub);
                        self.nfa.add_epsilon(hub, s);
                        self.nfa.add_epsilon(e, hub);
                        end = hub;
                    }
                    Some(max) => {
                        let exit = self.nfa.add_state(false);
                        for _ in repetition.min..max {
                            let (s, e) = self.fragment(&repetition.sub)?;
                            self.nfa.add_epsilon(end, exit);
                            self.nfa.add_epsilon(end, s);
                            end = e;
                        }
                        self.nfa.add_epsilon(end, exit);
                        end = exit;
                    }
                }
                Ok((start, end))
            }
        }
    }
}

impl Regex {
    /// Parses `pattern` and compiles it into an [`NFA`] over `alphabet`. Character classes
    /// (including `.` and negated classes) are intersected with the alphabet. The pattern has to
    /// match the whole word, anchors and other look-around assertions are not supported.
    pub fn to_nfa(pattern: &str, alphabet: &CharAlphabet) -> Result<NFA, RegexError> {
        let hir = regex_syntax::ParserBuilder::new()
            .dot_matches_new_line(true)
            .build()
            .parse(pattern)
            .map_err(Box::new)?;
        let mut thompson = Thompson {
            alphabet,
            nfa: NFA::for_alphabet(alphabet.clone()),
        };
        let (start, end) = thompson.fragment(&hir)?;
        let mut nfa = thompson.nfa;
        nfa.add_epsilon(nfa.initial(), start);
        nfa.set_accepting(end, true);
        debug!(
            "compiled pattern {pattern:?} into NFA with {} states",
            nfa.size()
        );
        Ok(nfa)
    }

    /// Compiles `pattern` into a [`DFA`] over `alphabet`, see [`Regex::to_nfa`].
    pub fn compile(pattern: &str, alphabet: &CharAlphabet) -> Result<DFA, RegexError> {
        Ok(Self::to_nfa(pattern, alphabet)?.determinize())
    }

    /// Compiles `self` into a [`DFA`] by rendering and parsing it.
    pub fn to_dfa(&self, alphabet: &CharAlphabet) -> Result<DFA, RegexError> {
        Self::compile(&self.render(alphabet), alphabet)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    use super::RegexError;

    #[test_log::test]
    fn compile_patterns() {
        let alphabet = CharAlphabet::from("abc");
        let dfa = Regex::compile("a(b|c)*", &alphabet).unwrap();
        assert!(dfa.consume_input("a"));
        assert!(dfa.consume_input("abcb"));
        assert!(!dfa.consume_input("ba"));

        let counted = Regex::compile("[^c]{2,3}", &alphabet).unwrap();
        assert!(counted.consume_input("ab"));
        assert!(counted.consume_input("bbb"));
        assert!(!counted.consume_input("a"));
        assert!(!counted.consume_input("abab"));
        assert!(!counted.consume_input("ac"));

        let any = Regex::compile(".*c", &alphabet).unwrap();
        assert!(any.consume_input("abc"));
        assert!(!any.consume_input("cb"));
    }

    #[test]
    fn compile_errors() {
        let alphabet = CharAlphabet::from("ab");
        assert!(matches!(
            Regex::compile("a(", &alphabet),
            Err(RegexError::Syntax(_))
        ));
        assert!(matches!(
            Regex::compile("^a$", &alphabet),
            Err(RegexError::Unsupported(_))
        ));
        assert!(matches!(
            Regex::compile("x", &alphabet),
            Err(RegexError::OutsideAlphabet(_))
        ));
        assert!(Regex::compile("[^\\x00-\\x{10FFFF}]", &alphabet)
            .unwrap()
            .is_empty_language());
    }

    #[test]
    fn regex_round_trip() {
        let alphabet = CharAlphabet::from("ab.");
        let dfa = DFA::builder()
            .with_alphabet(alphabet.clone())
            .with_state_colors([false, true, false])
            .with_edges([
                (0, '.', 1),
                (0, 'a', 2),
                (1, 'a', 1),
                (1, 'b', 0),
                (2, '.', 2),
                (2, 'b', 1),
            ])
            .into_dfa(0);
        let regex = dfa.to_regex();
        let compiled = regex.to_dfa(&alphabet).unwrap();
        assert!(compiled.equivalent(&dfa), "{}", regex.render(&alphabet));
    }
}
